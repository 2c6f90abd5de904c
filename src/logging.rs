use tracing_subscriber::EnvFilter;

/// Initialize diagnostic logging on stderr.
///
/// `RUST_LOG` wins when set; otherwise the level follows the number of `-v`
/// flags: warn, info, debug, trace.
pub fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,bookmark_tagger={}", default_level))
    });

    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    tracing::debug!("logging initialized at {}", default_level);
}
