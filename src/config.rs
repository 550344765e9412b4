use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_conn_max_lifetime_secs: u64,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: match env_non_empty("DATABASE_URL").or_else(|| env_non_empty("DB_URL")) {
                Some(url) => {
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    url
                }
                None => database_url_from_parts()?,
            },
            port: env_non_empty("PORT")
                .or_else(|| env_non_empty("API_PORT"))
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10)?,
            db_min_connections: parse_or("DB_MIN_CONNECTIONS", 0)?,
            db_conn_max_lifetime_secs: parse_or("DB_CONN_MAX_LIFETIME_SECS", 300)?,
            request_timeout_secs: parse_or("REQUEST_TIMEOUT_SECS", 15)?,
        };

        if config.db_max_connections == 0 {
            anyhow::bail!("DB_MAX_CONNECTIONS must be at least 1");
        }
        if config.db_min_connections > config.db_max_connections {
            anyhow::bail!("DB_MIN_CONNECTIONS cannot exceed DB_MAX_CONNECTIONS");
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        if let Ok(url) = url::Url::parse(&config.database_url) {
            tracing::debug!(
                "Database: {}:{}{}",
                url.host_str().unwrap_or("?"),
                url.port().unwrap_or(5432),
                url.path()
            );
        }
        tracing::debug!(
            "Pool: max={} min={} lifetime={}s",
            config.db_max_connections,
            config.db_min_connections,
            config.db_conn_max_lifetime_secs
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn conn_max_lifetime(&self) -> Duration {
        Duration::from_secs(self.db_conn_max_lifetime_secs)
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    match env_non_empty(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a non-negative number", key)),
        None => Ok(default),
    }
}

/// Assembles a connection URL from `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`
/// and `DB_SSLMODE`. User and database name are required.
fn database_url_from_parts() -> anyhow::Result<String> {
    let user = env_non_empty("DB_USER");
    let name = env_non_empty("DB_NAME");
    let (Some(user), Some(name)) = (user, name) else {
        anyhow::bail!("DATABASE_URL or DB_USER and DB_NAME environment variables required");
    };

    build_database_url(
        &env_non_empty("DB_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
        &env_non_empty("DB_PORT").unwrap_or_else(|| "5432".to_string()),
        &user,
        env_non_empty("DB_PASSWORD").as_deref(),
        &name,
        &env_non_empty("DB_SSLMODE").unwrap_or_else(|| "disable".to_string()),
    )
}

/// Builds a `postgres://` URL, percent-encoding credentials and database name.
pub fn build_database_url(
    host: &str,
    port: &str,
    user: &str,
    password: Option<&str>,
    dbname: &str,
    sslmode: &str,
) -> anyhow::Result<String> {
    let port: u16 = port
        .parse()
        .map_err(|_| anyhow::anyhow!("DB_PORT must be a valid number between 1-65535"))?;

    let mut url = url::Url::parse(&format!("postgres://{}", host))
        .map_err(|e| anyhow::anyhow!("DB_HOST is not a valid host: {}", e))?;
    url.set_port(Some(port))
        .map_err(|_| anyhow::anyhow!("DB_PORT cannot be applied to DB_HOST"))?;
    url.set_username(user)
        .map_err(|_| anyhow::anyhow!("DB_USER cannot be applied to DB_HOST"))?;
    url.set_password(password)
        .map_err(|_| anyhow::anyhow!("DB_PASSWORD cannot be applied to DB_HOST"))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("DB_HOST cannot carry a database name"))?
        .push(dbname);
    url.query_pairs_mut().append_pair("sslmode", sslmode);

    Ok(url.into())
}
