use log::LevelFilter;

/// Parse a level name, falling back to `Info` for anything unrecognised.
pub fn parse_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Info)
}

/// Install the colored terminal logger.  `RUST_LOG`, when set, overrides `level`.
pub fn init_logging(level: &str) {
    let mut clog = colog::default_builder();
    clog.filter(None, parse_level(level));
    if let Ok(filters) = std::env::var("RUST_LOG") {
        clog.parse_filters(&filters);
    }
    // A second call (tests, embedding) keeps the first logger
    let _ = clog.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level(" WARN "), LevelFilter::Warn);
        assert_eq!(parse_level("loud"), LevelFilter::Info);
    }
}
