use anyhow::{Result, anyhow};
use std::{env, str::FromStr};

/// How the availability ledger treats dates nobody configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProvisioningMode {
    #[default]
    Lenient,
    Strict,
}

impl FromStr for ProvisioningMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lenient" => Ok(ProvisioningMode::Lenient),
            "strict" => Ok(ProvisioningMode::Strict),
            other => Err(anyhow!(
                "Invalid AVAILABILITY_PROVISIONING '{}', expected 'lenient' or 'strict'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiration_days: i64,
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub client_base_url: String,
    /// Length of the default listing window starting today.
    pub schedule_window_days: i64,
    pub availability_provisioning: ProvisioningMode,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_env_only()
    }

    /// Load configuration from environment variables only, skipping `.env`.
    pub fn from_env_only() -> Result<Self> {
        let availability_provisioning = match env::var("AVAILABILITY_PROVISIONING") {
            Ok(value) => value.parse()?,
            Err(_) => ProvisioningMode::default(),
        };

        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://@localhost:5432/clinic_scheduler".to_string()),
            max_connections: parse_or("MAX_CONNECTIONS", 10),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                "your-super-secret-jwt-key-change-this-in-production-12345".to_string()
            }),
            jwt_expiration_days: parse_or("JWT_EXPIRATION_DAYS", 30),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("PORT", 8080),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            client_base_url: env::var("CLIENT_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            schedule_window_days: parse_or("SCHEDULE_WINDOW_DAYS", 14),
            availability_provisioning,
        })
    }

    pub fn test_config() -> Self {
        Config {
            database_url: "postgres://@localhost:5432/clinic_scheduler_test".to_string(),
            max_connections: 2,
            jwt_secret: "test-secret-key-for-testing-only".to_string(),
            jwt_expiration_days: 1,
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "test".to_string(),
            client_base_url: "http://localhost:3000".to_string(),
            schedule_window_days: 14,
            availability_provisioning: ProvisioningMode::Lenient,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
