//! Structured logging setup. The engine itself never prints; it emits
//! `tracing` events, and whatever process embeds it decides where those go.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a stderr `tracing` subscriber at `verbosity_level` (0 = info, 1 =
/// debug, 2+ = trace), overridable by `RUST_LOG`. Call once at startup.
pub fn install(verbosity_level: u8) {
    let filter = match verbosity_level {
        0 => tracing::level_filters::LevelFilter::INFO,
        1 => tracing::level_filters::LevelFilter::DEBUG,
        _ => tracing::level_filters::LevelFilter::TRACE,
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(filter.into()))
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("global tracing subscriber already installed");
    }
}
