mod commons;
mod poll_pipeline;
mod watch_pipeline;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
}
