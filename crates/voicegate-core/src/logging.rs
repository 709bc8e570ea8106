/// Install the global tracing subscriber.
///
/// Text format by default; `log_json` switches to structured JSON lines,
/// matching the `LOG_JSON` environment variable in the external interfaces
/// contract.
pub fn init(log_json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "voicegate=info,tower_http=info".into());

    if log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
