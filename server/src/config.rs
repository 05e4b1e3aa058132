use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::anyhow;

use apex_auth::session::DB_URL_ENV;

pub const SERVER_ADDR_ENV: &str = "APEX_SERVER_ADDR";
pub const DB_MAX_CONNECTIONS_ENV: &str = "DB_MAX_CONNECTIONS";
pub const DB_ACQUIRE_TIMEOUT_MS_ENV: &str = "DB_ACQUIRE_TIMEOUT_MS";
pub const DB_CONNECT_RETRY_S_ENV: &str = "DB_CONNECT_RETRY_S";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
pub const TRACING_LEVEL_ENV: &str = "TRACING_LEVEL";

const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_DB_ACQUIRE_TIMEOUT_MS: u64 = 5000;
const DEFAULT_DB_CONNECT_RETRY_S: u64 = 60;

/// Settings of the server, read once at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub database_url: String,
    pub server_addr: SocketAddr,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub db_connect_retry: Duration,
    pub tracing_level: tracing::Level,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup(DB_URL_ENV)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| anyhow!("Environment variable {DB_URL_ENV} must be set."))?;

        let default_server_addr = SocketAddr::from_str(DEFAULT_SERVER_ADDR)?;

        Ok(ServerConfig {
            database_url,
            server_addr: get_value_or_default(&lookup, SERVER_ADDR_ENV, default_server_addr),
            db_max_connections: get_value_or_default(&lookup, DB_MAX_CONNECTIONS_ENV, DEFAULT_DB_MAX_CONNECTIONS),
            db_acquire_timeout: Duration::from_millis(
                get_value_or_default(&lookup, DB_ACQUIRE_TIMEOUT_MS_ENV, DEFAULT_DB_ACQUIRE_TIMEOUT_MS)
            ),
            db_connect_retry: Duration::from_secs(
                get_value_or_default(&lookup, DB_CONNECT_RETRY_S_ENV, DEFAULT_DB_CONNECT_RETRY_S)
            ),
            tracing_level: get_value_or_default(&lookup, TRACING_LEVEL_ENV, tracing::Level::ERROR),
        })
    }
}

/// Level of the logger, read before the logger exists so nothing is logged here.
pub fn get_log_level() -> log::Level {
    env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|value| log::Level::from_str(value.trim()).ok())
        .unwrap_or(log::Level::Info)
}

fn get_value_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(name) {
        Some(value) => match T::from_str(value.trim()) {
            Ok(value) => {
                log::debug!("Got {name} from env variable: {value}");
                value
            },
            Err(e) => {
                log::error!("Could not parse {name} from '{value}': {e}, take default value {default}.");
                default
            },
        },
        None => {
            log::info!("Could not find {name} in env variable, take default value {default}.");
            default
        },
    }
}
