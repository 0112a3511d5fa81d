use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Installs the global subscriber, filtered by `RUST_LOG`. Records of the
/// `log` facade emitted by the trace modules are forwarded to it.
pub fn init() {
    Registry::default()
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();
}
