use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|n| n.parse::<u32>().ok())
            .unwrap_or(10);
        Ok(Self {
            port,
            database_url,
            host,
            max_connections,
        })
    }
}

/// Token settings are read at call time so the extractor and the login
/// service agree without threading config through every handler.
pub fn jwt_secret() -> anyhow::Result<String> {
    env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))
}

pub fn jwt_ttl_hours() -> i64 {
    env::var("JWT_TTL_HOURS")
        .ok()
        .and_then(|h| h.parse::<i64>().ok())
        .filter(|h| *h > 0)
        .unwrap_or(24)
}
