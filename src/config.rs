use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use rust_decimal::Decimal;

use crate::engine::ledger::{DEFAULT_LOW_BALANCE_THRESHOLD, DEFAULT_MONTHLY_ALLOWANCE};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,

    // Leave accounting
    pub default_leave_allowance: Decimal,
    pub low_balance_threshold: Decimal,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,

            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: or_default("API_PREFIX", "/api".to_string())?,
            log_dir: or_default("LOG_DIR", "logs".to_string())?,

            default_leave_allowance: or_default(
                "DEFAULT_LEAVE_ALLOWANCE",
                DEFAULT_MONTHLY_ALLOWANCE,
            )?,
            low_balance_threshold: or_default(
                "LOW_BALANCE_THRESHOLD",
                DEFAULT_LOW_BALANCE_THRESHOLD,
            )?,
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: "mysql://localhost/test".into(),
            jwt_secret: "test-secret".into(),
            server_addr: "127.0.0.1:0".into(),
            rate_protected_per_min: 1000,
            api_prefix: "/api".into(),
            log_dir: "logs".into(),
            default_leave_allowance: DEFAULT_MONTHLY_ALLOWANCE,
            low_balance_threshold: DEFAULT_LOW_BALANCE_THRESHOLD,
        }
    }
}
