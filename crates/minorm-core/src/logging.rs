//! Logging setup built on [`tracing`].
//!
//! The ORM logs every executed SQL statement at debug level; this module
//! provides the subscriber wiring for applications that want those logs.

/// Sets up the global tracing subscriber.
///
/// `level` is an `EnvFilter` directive (e.g. "debug", "info",
/// "minorm_db=debug"). In debug mode a pretty, human-readable format is
/// used; otherwise a structured JSON format.
///
/// Installing a second subscriber is a no-op, so calling this from several
/// tests is safe.
pub fn setup_logging(level: &str, debug: bool) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    if debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}
