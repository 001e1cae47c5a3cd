use anyhow::Result;

#[derive(Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub workflow: WorkflowConfig,
}

#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone)]
pub struct WorkflowConfig {
    pub checkout_ttl_minutes: i64,
    pub selection_batch: i64,
    pub callback_horizon_days: i64,
    pub callback_grace_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://leads:@localhost:5432/leadserver".to_string()),
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        };
        Ok(AppConfig {
            server: ServerConfig {
                host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: std::env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            database,
            workflow: WorkflowConfig::from_env(),
        })
    }
}

impl WorkflowConfig {
    pub fn from_env() -> Self {
        Self {
            checkout_ttl_minutes: env_i64("WORKFLOW_CHECKOUT_TTL_MINUTES", 30),
            selection_batch: env_i64("WORKFLOW_SELECTION_BATCH", 25),
            callback_horizon_days: env_i64("WORKFLOW_CALLBACK_HORIZON_DAYS", 60),
            callback_grace_minutes: env_i64("WORKFLOW_CALLBACK_GRACE_MINUTES", 5),
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
