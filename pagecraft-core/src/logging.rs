use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// `PAGECRAFT_LOG` wins when set; otherwise `level` is used. Invalid
/// directives fall back to `info`. Calling this twice is harmless.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_env("PAGECRAFT_LOG")
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
