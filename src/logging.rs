//! Logging setup for the binary.

use tracing::Level;

/// Parses a level name ("trace" through "error"), falling back to `info`.
pub fn parse_level(level: &str) -> Level {
    match level.parse::<Level>() {
        Ok(level) => level,
        Err(_) => {
            eprintln!("Unknown log level '{level}', using info");
            Level::INFO
        }
    }
}

/// Installs the global fmt subscriber. Logs go to stderr so stdout stays clean for
/// command output.
pub fn init_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
