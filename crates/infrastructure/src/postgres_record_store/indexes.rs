use super::*;

/// Renders the `CREATE INDEX` statement of one planned index.
///
/// Indexes are partial on the entity type so every entity shares the
/// `records` table. Unique indexes skip rows where an indexed field is null
/// or the partial condition fails, matching [`IndexSpec::entry`].
pub(super) fn index_statement(index: &IndexSpec) -> String {
    let columns = index
        .fields()
        .iter()
        .map(|field| format!("(data ->> {})", literal(field)))
        .collect::<Vec<_>>()
        .join(", ");

    let mut conditions = vec![format!("entity_type = {}", literal(index.entity_type().as_str()))];
    if index.is_unique() {
        conditions.extend(
            index
                .fields()
                .iter()
                .map(|field| format!("data ->> {} IS NOT NULL", literal(field))),
        );
    }
    if let Some((field, value)) = index.only_when() {
        conditions.push(format!(
            "data -> {} = {}::jsonb",
            literal(field),
            literal(value.to_string().as_str())
        ));
    }

    format!(
        "CREATE {}INDEX IF NOT EXISTS \"{}\" ON records ({columns}) WHERE {}",
        if index.is_unique() { "UNIQUE " } else { "" },
        index.name(),
        conditions.join(" AND ")
    )
}

fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
