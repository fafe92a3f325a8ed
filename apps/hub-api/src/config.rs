/// Hub API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Worker ID fed to the snowflake generator (relevant once more than
    /// one hub-api process appends messages).
    pub worker_id: u16,
    /// Community slugs to seed at startup, overriding the built-in genre
    /// list. `None` keeps the defaults.
    pub genres: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults that match the client's expected backend origin.
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            worker_id: std::env::var("WORKER_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            genres: std::env::var("GENRES").ok().map(parse_genres),
        }
    }
}

/// Parse a comma-separated `GENRES` value into seed slugs.
fn parse_genres(raw: String) -> Vec<String> {
    raw.split(',')
        .map(|slug| slug.trim().to_string())
        .filter(|slug| !slug.is_empty())
        .collect()
}
