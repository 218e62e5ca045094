use std::env;
use std::time::Duration;

/// Default upload limit: 500 MiB
pub const DEFAULT_MAX_FILE_SIZE: usize = 500 * 1024 * 1024;

/// Relational metadata store connection settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the individual parts
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    /// Require TLS for the Postgres connection
    pub ssl: bool,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            name: "videos".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            ssl: false,
            max_connections: 20,
        }
    }
}

impl DatabaseConfig {
    /// Connection URL handed to sea-orm.
    pub fn connection_url(&self) -> anyhow::Result<String> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }

        let mut url = url::Url::parse("postgres://localhost")?;
        url.set_host(Some(&self.host))?;
        url.set_port(Some(self.port))
            .map_err(|_| anyhow::anyhow!("invalid database port"))?;
        url.set_username(&self.user)
            .map_err(|_| anyhow::anyhow!("invalid database user"))?;
        if !self.password.is_empty() {
            url.set_password(Some(&self.password))
                .map_err(|_| anyhow::anyhow!("invalid database password"))?;
        }
        url.set_path(&format!("/{}", self.name));
        url.query_pairs_mut()
            .append_pair("sslmode", if self.ssl { "require" } else { "disable" });

        Ok(url.to_string())
    }

    /// Same URL with the password masked, for logging.
    pub fn redacted_url(&self) -> String {
        match self.connection_url().ok().and_then(|u| url::Url::parse(&u).ok()) {
            Some(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("****"));
                }
                url.to_string()
            }
            None => "<invalid database url>".to_string(),
        }
    }
}

/// Object storage provider settings
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub bucket: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO etc.)
    pub endpoint: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            bucket: None,
            endpoint: None,
        }
    }
}

/// Allowed cross-origin request sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl CorsOrigins {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == "*" {
            return CorsOrigins::Any;
        }
        CorsOrigins::List(
            value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,

    /// Listening port (default: 4000)
    pub port: u16,

    pub allowed_origins: CorsOrigins,

    /// Maximum video size in bytes (default: 500 MiB)
    pub max_file_size: usize,

    /// Grace period for in-flight requests on shutdown (default: 10 s)
    pub shutdown_grace: Duration,

    /// How often the orphan sweeper runs (default: 1 h)
    pub orphan_sweep_interval: Duration,

    /// Stored objects younger than this are never swept (default: 1 h)
    pub orphan_min_age: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            storage: StorageConfig::default(),
            port: 4000,
            allowed_origins: CorsOrigins::Any,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            shutdown_grace: Duration::from_secs(10),
            orphan_sweep_interval: Duration::from_secs(3600),
            orphan_min_age: Duration::from_secs(3600),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        let parsed = |key: &str| var(key).and_then(|v| v.trim().parse::<u64>().ok());
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let database = DatabaseConfig {
            url: non_empty("DATABASE_URL"),
            host: non_empty("DB_HOST").unwrap_or(default.database.host),
            port: var("DB_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default.database.port),
            name: non_empty("DB_NAME").unwrap_or(default.database.name),
            user: non_empty("DB_USER").unwrap_or(default.database.user),
            password: var("DB_PASSWORD").unwrap_or(default.database.password),
            ssl: var("DB_SSL")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.database.ssl),
            max_connections: var("DB_MAX_CONNECTIONS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default.database.max_connections),
        };

        let storage = StorageConfig {
            region: non_empty("AWS_REGION").unwrap_or(default.storage.region),
            access_key_id: non_empty("AWS_ACCESS_KEY_ID"),
            secret_access_key: non_empty("AWS_SECRET_ACCESS_KEY"),
            session_token: non_empty("AWS_SESSION_TOKEN"),
            bucket: non_empty("S3_BUCKET_NAME"),
            endpoint: non_empty("S3_ENDPOINT"),
        };

        Self {
            database,
            storage,
            port: var("PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default.port),
            allowed_origins: var("CORS_ORIGIN")
                .map(|v| CorsOrigins::parse(&v))
                .unwrap_or(default.allowed_origins),
            max_file_size: var("MAX_FILE_SIZE")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default.max_file_size),
            shutdown_grace: parsed("SHUTDOWN_GRACE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(default.shutdown_grace),
            orphan_sweep_interval: parsed("ORPHAN_SWEEP_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(default.orphan_sweep_interval),
            orphan_min_age: parsed("ORPHAN_MIN_AGE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(default.orphan_min_age),
        }
    }

    /// Config for local development and tests (in-memory SQLite, small grace periods)
    pub fn development() -> Self {
        Self {
            database: DatabaseConfig {
                url: Some("sqlite::memory:".to_string()),
                max_connections: 1,
                ..DatabaseConfig::default()
            },
            storage: StorageConfig {
                bucket: Some("videos-dev".to_string()),
                ..StorageConfig::default()
            },
            shutdown_grace: Duration::from_secs(1),
            ..Self::default()
        }
    }
}
