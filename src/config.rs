use std::env;
use std::path::PathBuf;

use crate::engine::access::ReadPolicy;
use crate::engine::lifecycle::TransitionPolicy;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub transition_policy: TransitionPolicy,
    pub read_policy: ReadPolicy,
    pub estimated_delivery_minutes: i64,
    pub seed_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let estimated_delivery_minutes = parse_or_default("ESTIMATED_DELIVERY_MINUTES", 45)?;
        if estimated_delivery_minutes < 0 {
            return Err(AppError::Internal(
                "invalid ESTIMATED_DELIVERY_MINUTES: must not be negative".to_string(),
            ));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            transition_policy: parse_or_default("TRANSITION_POLICY", TransitionPolicy::Forward)?,
            read_policy: parse_or_default("ORDER_READ_POLICY", ReadPolicy::Broad)?,
            estimated_delivery_minutes,
            seed_path: env::var("SEED_PATH").ok().map(PathBuf::from),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            transition_policy: TransitionPolicy::Forward,
            read_policy: ReadPolicy::Broad,
            estimated_delivery_minutes: 45,
            seed_path: None,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
