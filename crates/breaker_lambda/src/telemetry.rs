use tracing_subscriber::EnvFilter;

/// JSON log lines for CloudWatch. Level comes from `RUST_LOG`, default `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        // disabling time is handy because CloudWatch adds the ingestion time.
        .without_time()
        .with_target(false)
        .init();
}
