use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Events go to stderr
/// so command output on stdout stays clean.
///
/// # Errors
/// * A global subscriber is already installed
pub fn init(default_filter: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        // Other tests may already have installed a subscriber; either way
        // the second call in this test must fail rather than panic.
        let _ = init("session_service=debug");
        assert!(init("session_service=debug").is_err());
    }
}
