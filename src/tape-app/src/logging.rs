// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Pick the effective level: `verbose` forces DEBUG, otherwise the
/// configured level, falling back to INFO if it is None or invalid.
pub fn resolve_level(log_level: Option<&str>, verbose: bool) -> Level {
    if verbose {
        return Level::DEBUG;
    }
    log_level
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::INFO)
}

/// Install the global fmt subscriber.
pub fn init_logging(log_level: Option<&str>, verbose: bool) {
    FmtSubscriber::builder()
        .with_target(false)
        .with_max_level(resolve_level(log_level, verbose))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_level() {
        assert_eq!(resolve_level(None, false), Level::INFO);
        assert_eq!(resolve_level(Some("warn"), false), Level::WARN);
        assert_eq!(resolve_level(Some("bogus"), false), Level::INFO);
        assert_eq!(resolve_level(Some("error"), true), Level::DEBUG);
    }
}
