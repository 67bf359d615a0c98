use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use enermina_application::LifecycleConfig;
use enermina_core::AppError;
use tracing_subscriber::EnvFilter;

const DEFAULT_SUPPORT_ADDRESS: &str = "svp@enermina.org";

#[derive(Debug, Clone)]
pub struct SmtpRuntimeConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub enum EmailProviderConfig {
    Console,
    Smtp(SmtpRuntimeConfig),
}

#[derive(Debug, Clone)]
pub struct SearchRuntimeConfig {
    pub api_url: String,
    pub app_id: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub enum SearchProviderConfig {
    Memory,
    Http(SearchRuntimeConfig),
}

#[derive(Debug, Clone)]
pub enum StoreBackendConfig {
    Memory,
    Postgres { database_url: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub api_host: String,
    pub api_port: u16,
    pub frontend_url: String,
    pub store_backend: StoreBackendConfig,
    pub gateway_shared_secret: String,
    pub email_provider: EmailProviderConfig,
    pub support_email_address: String,
    pub search_provider: SearchProviderConfig,
    pub stream_api_secret: String,
    pub lifecycle: LifecycleConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_source(migrate_only, |name| env::var(name).ok())
    }

    fn from_source<F>(migrate_only: bool, source: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvSource(source);

        let api_host = env.or("API_HOST", "127.0.0.1");
        let api_port = env
            .optional("API_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let frontend_url = env.or("FRONTEND_URL", "http://localhost:3000");

        let store_backend = match env.or("STORE_BACKEND", "memory").as_str() {
            "memory" => StoreBackendConfig::Memory,
            "postgres" => StoreBackendConfig::Postgres {
                database_url: env.required_non_empty("DATABASE_URL")?,
            },
            other => {
                return Err(AppError::Validation(format!(
                    "STORE_BACKEND must be either 'memory' or 'postgres', got '{other}'"
                )));
            }
        };

        let gateway_shared_secret = env.required_non_empty("GATEWAY_SHARED_SECRET")?;
        if gateway_shared_secret.len() < 32 {
            return Err(AppError::Validation(
                "GATEWAY_SHARED_SECRET must be at least 32 characters".to_owned(),
            ));
        }

        let email_provider = match env.or("EMAIL_PROVIDER", "console").as_str() {
            "console" => EmailProviderConfig::Console,
            "smtp" => {
                let port = env
                    .required_non_empty("SMTP_PORT")?
                    .parse::<u16>()
                    .map_err(|error| AppError::Validation(format!("invalid SMTP_PORT: {error}")))?;
                EmailProviderConfig::Smtp(SmtpRuntimeConfig {
                    host: env.required_non_empty("SMTP_HOST")?,
                    port,
                    username: env.required_non_empty("SMTP_USERNAME")?,
                    password: env.required_non_empty("SMTP_PASSWORD")?,
                    from_address: env.or("SUPPORT_SENDER_ADDRESS", DEFAULT_SUPPORT_ADDRESS),
                })
            }
            other => {
                return Err(AppError::Validation(format!(
                    "EMAIL_PROVIDER must be either 'console' or 'smtp', got '{other}'"
                )));
            }
        };

        let search_provider = match env.or("SEARCH_PROVIDER", "memory").as_str() {
            "memory" => SearchProviderConfig::Memory,
            "http" => SearchProviderConfig::Http(SearchRuntimeConfig {
                api_url: env.required_non_empty("SEARCH_API_URL")?,
                app_id: env.required_non_empty("SEARCH_APP_ID")?,
                api_key: env.required_non_empty("SEARCH_API_KEY")?,
            }),
            other => {
                return Err(AppError::Validation(format!(
                    "SEARCH_PROVIDER must be either 'memory' or 'http', got '{other}'"
                )));
            }
        };

        let defaults = LifecycleConfig::default();
        let lifecycle = LifecycleConfig {
            notification_max_delivery_attempts: env.positive(
                "NOTIFICATION_MAX_DELIVERY_ATTEMPTS",
                defaults.notification_max_delivery_attempts,
            )?,
            payment_max_attempts: env
                .positive("PAYMENT_MAX_ATTEMPTS", defaults.payment_max_attempts)?,
        };

        Ok(Self {
            migrate_only,
            api_host,
            api_port,
            frontend_url,
            store_backend,
            gateway_shared_secret,
            email_provider,
            support_email_address: env.or("SUPPORT_EMAIL_ADDRESS", DEFAULT_SUPPORT_ADDRESS),
            search_provider,
            stream_api_secret: env.required_non_empty("STREAM_API_SECRET")?,
            lifecycle,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

struct EnvSource<F>(F);

impl<F> EnvSource<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|value| !value.trim().is_empty())
    }

    fn or(&self, name: &str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_owned())
    }

    fn required_non_empty(&self, name: &str) -> Result<String, AppError> {
        let value = (self.0)(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{name} must not be empty")));
        }

        Ok(value)
    }

    fn positive(&self, name: &str, default: u32) -> Result<u32, AppError> {
        let Some(value) = self.optional(name) else {
            return Ok(default);
        };

        match value.parse::<u32>() {
            Ok(parsed) if parsed > 0 => Ok(parsed),
            _ => Err(AppError::Validation(format!(
                "{name} must be a positive integer, got '{value}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use enermina_core::AppError;

    use super::{ApiConfig, EmailProviderConfig, SearchProviderConfig, StoreBackendConfig};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(values: &[(&str, &str)]) -> Result<ApiConfig, AppError> {
        let values: HashMap<String, String> = values
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        ApiConfig::from_source(false, |name| values.get(name).cloned())
    }

    #[test]
    fn minimal_environment_uses_in_memory_adapters() {
        let config = load(&[
            ("GATEWAY_SHARED_SECRET", SECRET),
            ("STREAM_API_SECRET", "stream"),
        ])
        .unwrap_or_else(|_| unreachable!());

        assert!(matches!(config.store_backend, StoreBackendConfig::Memory));
        assert!(matches!(config.email_provider, EmailProviderConfig::Console));
        assert!(matches!(config.search_provider, SearchProviderConfig::Memory));
        assert_eq!(config.support_email_address, "svp@enermina.org");
        assert_eq!(config.lifecycle.payment_max_attempts, 3);
        assert_eq!(config.api_port, 3001);
    }

    #[test]
    fn postgres_backend_requires_a_database_url() {
        let result = load(&[
            ("GATEWAY_SHARED_SECRET", SECRET),
            ("STREAM_API_SECRET", "stream"),
            ("STORE_BACKEND", "postgres"),
        ]);

        assert!(matches!(result, Err(AppError::Validation(message)) if message.contains("DATABASE_URL")));
    }

    #[test]
    fn short_gateway_secrets_are_rejected() {
        let result = load(&[
            ("GATEWAY_SHARED_SECRET", "short"),
            ("STREAM_API_SECRET", "stream"),
        ]);

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn retry_ceilings_must_be_positive() {
        let result = load(&[
            ("GATEWAY_SHARED_SECRET", SECRET),
            ("STREAM_API_SECRET", "stream"),
            ("PAYMENT_MAX_ATTEMPTS", "0"),
        ]);
        assert!(matches!(result, Err(AppError::Validation(_))));

        let config = load(&[
            ("GATEWAY_SHARED_SECRET", SECRET),
            ("STREAM_API_SECRET", "stream"),
            ("NOTIFICATION_MAX_DELIVERY_ATTEMPTS", "5"),
        ])
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.lifecycle.notification_max_delivery_attempts, 5);
    }

    #[test]
    fn unknown_providers_are_rejected() {
        let result = load(&[
            ("GATEWAY_SHARED_SECRET", SECRET),
            ("STREAM_API_SECRET", "stream"),
            ("SEARCH_PROVIDER", "elastic"),
        ]);

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
