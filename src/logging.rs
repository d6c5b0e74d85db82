use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub const LOG_ENV: &str = "VOICE_REMINDERS_LOG";

pub fn default_directives(component: &str) -> String {
    format!("info,voice_reminders=debug,{component}=debug")
}

/// Picks the first usable filter from `VOICE_REMINDERS_LOG`, the config file's
/// `logging.filter`, then `RUST_LOG`. Blank or unparsable candidates are skipped.
pub fn select_directives(
    component: &str,
    log_env: Option<&str>,
    configured: Option<&str>,
    rust_log: Option<&str>,
) -> String {
    [log_env, configured, rust_log]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|candidate| !candidate.is_empty() && EnvFilter::try_new(candidate).is_ok())
        .map(str::to_string)
        .unwrap_or_else(|| default_directives(component))
}

pub fn init_tracing(component: &str, config: &LoggingConfig) {
    let log_env = std::env::var(LOG_ENV).ok();
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = select_directives(
        component,
        log_env.as_deref(),
        config.filter.as_deref(),
        rust_log.as_deref(),
    );
    let filter = EnvFilter::try_new(&directives)
        .unwrap_or_else(|_| EnvFilter::new(default_directives(component)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_span_events(FmtSpan::CLOSE)
        .compact()
        .try_init();

    tracing::debug!(component, filter = %directives, "Tracing initialized");
}
