use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const WORKSPACE_CRATES: &[&str] = &[
    "server",
    "services",
    "db",
    "deployment",
    "local_deployment",
    "utils",
];

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise workspace crates log at `level` and
/// everything else at `warn`.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives = WORKSPACE_CRATES
            .iter()
            .map(|krate| format!("{krate}={level}"))
            .chain(["tower_http=info".to_string(), "warn".to_string()])
            .collect::<Vec<_>>()
            .join(",");
        EnvFilter::new(directives)
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}
