//! Log output for the `gcoe` binary.
//!
//! Reports are printed on stdout, so every log line is written to stderr.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Route `tracing` events to stderr, filtered by `RUST_LOG` or else `level`.
///
/// With `json` set, each event is one JSON object per line. Returns `false`
/// when a global subscriber was already installed; that one stays in place.
pub fn init_tracing(json: bool, level: Level) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let lines = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let output = if json {
        lines.json().boxed()
    } else {
        lines.boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_keeps_first_subscriber() {
        init_tracing(false, Level::WARN);
        assert!(!init_tracing(true, Level::DEBUG));
    }
}
