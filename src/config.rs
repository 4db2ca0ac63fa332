use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Without it the API runs on the in-memory store.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    // Identity provider session tokens
    pub auth_jwt_public_key: Option<String>,
    pub auth_jwt_secret: Option<String>,
    pub auth_issuer: Option<String>,

    pub pixabay_api_key: String,
    pub image_timeout_secs: u64,

    // Admission control
    pub rate_limit_capacity: u32,
    pub rate_limit_refill: u32,
    pub rate_limit_interval_secs: u64,
    pub blocked_identities: Vec<String>,
    pub admission_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let config = Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_extra_origins: list_var("CORS_EXTRA_ORIGINS"),

            auth_jwt_public_key: env::var("AUTH_JWT_PUBLIC_KEY").ok().filter(|s| !s.is_empty()),
            auth_jwt_secret: env::var("AUTH_JWT_SECRET").ok().filter(|s| !s.is_empty()),
            auth_issuer: env::var("AUTH_ISSUER").ok().filter(|s| !s.is_empty()),

            pixabay_api_key: env::var("PIXABAY_API_KEY").unwrap_or_default(),
            image_timeout_secs: env::var("IMAGE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),

            rate_limit_capacity: env::var("RATE_LIMIT_CAPACITY")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .expect("RATE_LIMIT_CAPACITY must be a number"),
            rate_limit_refill: env::var("RATE_LIMIT_REFILL")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .expect("RATE_LIMIT_REFILL must be a number"),
            rate_limit_interval_secs: env::var("RATE_LIMIT_INTERVAL_SECS")
                .unwrap_or_else(|_| "3600".into())
                .parse()
                .expect("RATE_LIMIT_INTERVAL_SECS must be a number"),
            blocked_identities: list_var("BLOCKED_IDENTITIES"),
            admission_timeout_ms: env::var("ADMISSION_TIMEOUT_MS")
                .unwrap_or_else(|_| "2000".into())
                .parse()
                .unwrap_or(2000),
        };

        if config.auth_jwt_public_key.is_none() && config.auth_jwt_secret.is_none() {
            panic!("AUTH_JWT_PUBLIC_KEY or AUTH_JWT_SECRET must be set");
        }

        config
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn list_var(key: &str) -> Vec<String> {
    env::var(key)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
