use crate::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Resolves the effective filter: `RUST_LOG` when set, else `configured_level`.
pub fn resolve_filter(env_value: Option<String>, configured_level: &str) -> Result<(String, EnvFilter)> {
    let log_level = env_value.unwrap_or_else(|| configured_level.to_string());

    let filter = EnvFilter::try_new(&log_level).map_err(|_| {
        Error::config(format!(
            "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
            log_level
        ))
    })?;

    Ok((log_level, filter))
}

/// Installs the JSON subscriber and returns the level in effect.
pub fn init(configured_level: &str) -> Result<String> {
    let (log_level, filter) = resolve_filter(std::env::var("RUST_LOG").ok(), configured_level)?;

    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    Ok(log_level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_env_value_overrides_config() {
        let (level, _) = resolve_filter(Some("debug".to_string()), "info").unwrap();
        assert_eq!(level, "debug");

        let (level, _) = resolve_filter(None, "warn").unwrap();
        assert_eq!(level, "warn");
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let err = resolve_filter(None, "ai_query_server=verbose").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
