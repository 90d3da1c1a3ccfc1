//! Logging setup

use tracing::log::LevelFilter;

/// Picks the base log level, `debug` wins over `quiet`.
pub fn log_level(debug: bool, quiet: bool) -> LevelFilter {
    match (debug, quiet) {
        (true, _) => LevelFilter::Debug,
        (false, true) => LevelFilter::Warn,
        (false, false) => LevelFilter::Info,
    }
}

/// HTTP plumbing that only gets to speak up at Warn unless debugging.
pub const NOISY_MODULES: &[&str] = &["reqwest", "hyper_util", "rustls", "tracing"];

/// Sets up logging for an interactive run. Timestamps are left off since
/// log lines are interleaved with the selection prompts.
pub fn setup_logging(debug: bool, quiet: bool) -> Result<(), Box<std::io::Error>> {
    let mut logger = simple_logger::SimpleLogger::new()
        .with_level(log_level(debug, quiet))
        .without_timestamps();
    if !debug {
        for module in NOISY_MODULES {
            logger = logger.with_module_level(module, LevelFilter::Warn);
        }
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}
