use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize a tracing subscriber printing compact logs to stderr.
///
/// The filter comes from `RUST_LOG`, defaulting to "info".
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_with_default("info")
}

/// Initialize logging with `default_filter` used when `RUST_LOG` is unset.
pub fn init_with_default(
    default_filter: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    let filter_layer =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_refused() {
        // Whichever call ran first owns the global subscriber
        let _ = init();
        let err = init_with_default("debug").unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
