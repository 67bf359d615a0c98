use std::collections::HashMap;

use async_trait::async_trait;
use enermina_application::SearchIndex;
use enermina_core::AppResult;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

type Documents = HashMap<String, HashMap<String, Map<String, Value>>>;

/// Search index keeping documents in memory, for development.
#[derive(Debug, Default)]
pub struct InMemorySearchIndex {
    documents: RwLock<Documents>,
}

impl InMemorySearchIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a stored document.
    pub async fn document(&self, index_name: &str, object_id: &str) -> Option<Map<String, Value>> {
        self.documents
            .read()
            .await
            .get(index_name)
            .and_then(|documents| documents.get(object_id))
            .cloned()
    }
}

#[async_trait]
impl SearchIndex for InMemorySearchIndex {
    async fn upsert(
        &self,
        index_name: &str,
        object_id: &str,
        body: Map<String, Value>,
    ) -> AppResult<()> {
        let mut document = body;
        document.insert("objectID".to_owned(), Value::String(object_id.to_owned()));

        self.documents
            .write()
            .await
            .entry(index_name.to_owned())
            .or_default()
            .insert(object_id.to_owned(), document);
        debug!(index_name, object_id, "search document stored");
        Ok(())
    }

    async fn delete(&self, index_name: &str, object_id: &str) -> AppResult<()> {
        if let Some(documents) = self.documents.write().await.get_mut(index_name) {
            documents.remove(object_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use enermina_application::SearchIndex;
    use enermina_core::AppResult;
    use serde_json::{Map, json};

    use super::InMemorySearchIndex;

    #[tokio::test]
    async fn upserts_replace_and_deletes_are_idempotent() -> AppResult<()> {
        let index = InMemorySearchIndex::new();
        let mut body = Map::new();
        body.insert("title".to_owned(), json!("Solar"));

        index.upsert("articles", "a-1", body.clone()).await?;
        body.insert("title".to_owned(), json!("Wind"));
        index.upsert("articles", "a-1", body).await?;

        let stored = index.document("articles", "a-1").await.unwrap_or_default();
        assert_eq!(stored.get("title"), Some(&json!("Wind")));
        assert_eq!(stored.get("objectID"), Some(&json!("a-1")));

        index.delete("articles", "a-1").await?;
        index.delete("articles", "a-1").await?;
        assert!(index.document("articles", "a-1").await.is_none());
        Ok(())
    }
}
