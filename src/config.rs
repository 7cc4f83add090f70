use std::env;

/// Central configuration, read once at startup from environment variables.
/// Mirrors the shape of `rate_limit::RateLimitConfig::from_env` but covers the
/// whole service rather than just rate limiting.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub redis_url: Option<String>,
    pub recency_window_days: i64,
    pub default_match_radius_miles: i32,
    pub email_enabled: bool,
    pub email_api_url: Option<String>,
    pub email_api_key: Option<String>,
    pub email_from: String,
    pub test_auth_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "data/wingman.db".to_string(),
            redis_url: None,
            recency_window_days: 7,
            default_match_radius_miles: 25,
            email_enabled: false,
            email_api_url: None,
            email_api_key: None,
            email_from: "noreply@wingmanmatch.temp".to_string(),
            test_auth_enabled: false,
        }
    }
}

impl Config {
    /// Build configuration from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `DATABASE_PATH` — SQLite file path (default: data/wingman.db)
    /// - `REDIS_URL` — distributed cache connection string; absent disables the Redis backend
    /// - `RECENCY_WINDOW_DAYS` — matcher rematch-cooldown window (default: 7)
    /// - `DEFAULT_MATCH_RADIUS_MILES` — default matcher search radius (default: 25)
    /// - `EMAIL_ENABLED` — feature flag for outbound email (default: false)
    /// - `EMAIL_API_URL` / `EMAIL_API_KEY` / `EMAIL_FROM` — outbound email provider settings
    /// - `TEST_AUTH_ENABLED` — development-only flag allowing `X-Test-User-Id` to stand in for real auth
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = env::var("DATABASE_PATH") {
            config.database_path = val;
        }
        if let Ok(val) = env::var("REDIS_URL")
            && !val.is_empty()
        {
            config.redis_url = Some(val);
        }
        if let Ok(val) = env::var("RECENCY_WINDOW_DAYS")
            && let Ok(n) = val.parse::<i64>()
        {
            config.recency_window_days = n;
        }
        if let Ok(val) = env::var("DEFAULT_MATCH_RADIUS_MILES")
            && let Ok(n) = val.parse::<i32>()
        {
            config.default_match_radius_miles = n;
        }
        if let Ok(val) = env::var("EMAIL_ENABLED") {
            config.email_enabled = val == "1" || val.eq_ignore_ascii_case("true");
        }
        if let Ok(val) = env::var("EMAIL_API_URL")
            && !val.is_empty()
        {
            config.email_api_url = Some(val);
        }
        if let Ok(val) = env::var("EMAIL_API_KEY")
            && !val.is_empty()
        {
            config.email_api_key = Some(val);
        }
        if let Ok(val) = env::var("EMAIL_FROM") {
            config.email_from = val;
        }
        if let Ok(val) = env::var("TEST_AUTH_ENABLED") {
            config.test_auth_enabled = val == "1" || val.eq_ignore_ascii_case("true");
        }

        config
    }
}
