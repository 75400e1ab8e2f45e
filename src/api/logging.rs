//! Subscriber setup for embedding binaries and tests.

use tracing::{debug, Level};

/// Install a fmt subscriber. Returns `false`, leaving the existing one in
/// place, when a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> bool {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    match tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
    {
        Ok(()) => true,
        Err(err) => {
            debug!("keeping existing tracing subscriber: {}", err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_keeps_the_installed_subscriber() {
        init_tracing(false);
        assert!(!init_tracing(true));
    }
}
