use log::warn;
use std::env;
use url::Url;

use crate::services::history::DEFAULT_HISTORY_CAPACITY;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;
const MONGODB_URI: &str = "mongodb://localhost:27017";
const MONGODB_DATABASE: &str = "estimator";
const APP_BASE_URL: &str = "http://localhost:3000";
const CRM_ESTIMATE_FIELD_KEY: &str = "estimate_link";
const DEV_JWT_SECRET: &str = "default_secret";

#[derive(Debug, Clone)]
pub struct CrmConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub estimate_field_key: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongo_uri: String,
    pub database: String,
    pub jwt_secret: String,
    pub app_base_url: String,
    pub history_capacity: usize,
    pub crm: CrmConfig,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    parse_or(key, env::var(key).ok().as_deref(), default)
}

// Unset keeps the default quietly, unparsable keeps it with a warning.
fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<&str>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!("Ignoring invalid {}: {}", key, raw);
            default
        }
    }
}

fn jwt_secret() -> String {
    non_empty("JWT_SECRET").unwrap_or_else(|| {
        warn!("JWT_SECRET is not set, using the development secret");
        DEV_JWT_SECRET.to_string()
    })
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

// A malformed CRM endpoint disables the sync instead of failing every request.
fn crm_url(key: &str) -> Option<String> {
    let raw = non_empty(key)?;
    match Url::parse(&raw) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(raw),
        _ => {
            warn!("Ignoring invalid {}: {}", key, raw);
            None
        }
    }
}

impl AppConfig {
    /// Reads configuration from environment variables, falling back to
    /// local development defaults.
    pub fn from_env() -> Self {
        Self {
            host: var_or("HOST", HOST),
            port: parsed_or("PORT", PORT),
            mongo_uri: var_or("MONGODB_URI", MONGODB_URI),
            database: var_or("MONGODB_DATABASE", MONGODB_DATABASE),
            jwt_secret: jwt_secret(),
            app_base_url: var_or("APP_BASE_URL", APP_BASE_URL),
            history_capacity: parsed_or("HISTORY_CAPACITY", DEFAULT_HISTORY_CAPACITY),
            crm: CrmConfig {
                api_url: crm_url("CRM_API_URL"),
                api_key: non_empty("CRM_API_KEY"),
                estimate_field_key: var_or("CRM_ESTIMATE_FIELD_KEY", CRM_ESTIMATE_FIELD_KEY),
            },
        }
    }
}
