use anyhow::{Context, Result};

const DEFAULT_DATABASE_URL: &str = "sqlite://resume_screener.db?mode=rwc";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub port: u16,
    pub rust_log: String,
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub max_resumes_per_request: usize,
    pub max_resume_chars: usize,
    pub evaluation_concurrency: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL", DEFAULT_DATABASE_URL),
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_model: optional_env("OPENAI_MODEL", DEFAULT_MODEL),
            openai_base_url: optional_env("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            jwt_secret: require_env("JWT_SECRET")?,
            jwt_ttl_hours: parse_env("JWT_TTL_HOURS", 24)?,
            port: parse_env("PORT", 8000)?,
            rust_log: optional_env("RUST_LOG", "info"),
            cors_origins: split_origins(&optional_env("CORS_ORIGINS", "http://localhost:8501")),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            max_resumes_per_request: parse_env("MAX_RESUMES_PER_REQUEST", 20)?,
            max_resume_chars: parse_env("MAX_RESUME_CHARS", 20_000)?,
            evaluation_concurrency: parse_env::<usize>("EVALUATION_CONCURRENCY", 4)?.max(1),
        })
    }

    /// Configuration for tests: in-memory database and fixed secrets.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            openai_api_key: "test-key".to_string(),
            openai_model: DEFAULT_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_ttl_hours: 1,
            port: 0,
            rust_log: "debug".to_string(),
            cors_origins: vec!["http://localhost:8501".to_string()],
            max_upload_bytes: 1024 * 1024,
            max_resumes_per_request: 3,
            max_resume_chars: 20_000,
            evaluation_concurrency: 2,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_origins_trims_and_drops_empty() {
        let origins = split_origins(" http://a.test , ,http://b.test,");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u16 = parse_env("SCREENER_TEST_UNSET_PORT", 8000).unwrap();
        assert_eq!(value, 8000);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("SCREENER_TEST_BAD_PORT", "eighty");
        let result: Result<u16> = parse_env("SCREENER_TEST_BAD_PORT", 8000);
        assert!(result.is_err());
        std::env::remove_var("SCREENER_TEST_BAD_PORT");
    }
}
