//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout stays clean for command output.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::BriefError;

/// Install the global tracing subscriber.
///
/// `level` overrides `RUST_LOG`; with neither set the filter is `warn`.
///
/// # Errors
///
/// Returns [`BriefError::Config`] if the filter string is invalid or a
/// subscriber is already installed.
///
/// # Examples
///
/// ```no_run
/// use codebrief_core::logging::init_logging;
///
/// init_logging(Some("debug"), false).unwrap();
/// ```
pub fn init_logging(level: Option<&str>, no_color: bool) -> Result<(), BriefError> {
    let default_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    let filter_str = level.unwrap_or(&default_level);

    let env_filter = EnvFilter::try_new(filter_str)
        .map_err(|e| BriefError::Config(format!("invalid log filter '{filter_str}': {e}")))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(!no_color && std::env::var("NO_COLOR").is_err());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| BriefError::Config(format!("failed to init logging: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_is_config_error() {
        let err = init_logging(Some("codebrief=loudest"), true).unwrap_err();
        assert!(matches!(err, BriefError::Config(_)));
    }
}
