use std::env;

/// Deployment environment, read from the `ENVIRONMENT` variable.
///
/// Controls log formatting (pretty for development, JSON for production).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Unknown or missing values fall back to development.
    pub fn from_env() -> Self {
        match env::var("ENVIRONMENT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}
