use crate::app_config::{AppConfig, Environment};
use crate::locations::{DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_UPLOAD_BYTES};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a
/// plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("GEOLOAD_ENV", "development"))?;

    let bind_addr = parse_addr("GEOLOAD_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("GEOLOAD_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("GEOLOAD_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("GEOLOAD_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("GEOLOAD_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    if db_min_connections > db_max_connections {
        return Err(invalid(
            "GEOLOAD_DB_MIN_CONNECTIONS",
            format!("must not exceed GEOLOAD_DB_MAX_CONNECTIONS ({db_max_connections})"),
        ));
    }

    let max_upload_bytes = parse_usize(
        "GEOLOAD_MAX_UPLOAD_BYTES",
        &DEFAULT_MAX_UPLOAD_BYTES.to_string(),
    )?;
    if max_upload_bytes == 0 {
        return Err(invalid(
            "GEOLOAD_MAX_UPLOAD_BYTES",
            "must be greater than zero".to_string(),
        ));
    }

    let max_batch_size = parse_usize(
        "GEOLOAD_MAX_BATCH_SIZE",
        &DEFAULT_MAX_BATCH_SIZE.to_string(),
    )?;
    if max_batch_size == 0 || max_batch_size > DEFAULT_MAX_BATCH_SIZE {
        return Err(invalid(
            "GEOLOAD_MAX_BATCH_SIZE",
            format!("must be between 1 and {DEFAULT_MAX_BATCH_SIZE}"),
        ));
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        max_upload_bytes,
        max_batch_size,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "GEOLOAD_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
