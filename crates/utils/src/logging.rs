use tracing_subscriber::{EnvFilter, prelude::*};

/// Build the filter directive string: `warn` for dependencies, `RUST_LOG` (default `info`)
/// for the workspace crates.
pub fn filter_directives(level: &str, crates: &[&str]) -> String {
    let mut directives = String::from("warn");
    for name in crates {
        directives.push_str(&format!(",{}={}", name, level));
    }
    directives
}

/// Install the global fmt subscriber. Logs go to stderr so CLI output on stdout stays clean.
pub fn init_tracing(crates: &[&str]) {
    init_tracing_at("info", crates);
}

/// Like [`init_tracing`], with the level used when `RUST_LOG` is unset.
pub fn init_tracing_at(default_level: &str, crates: &[&str]) {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    let env_filter = EnvFilter::try_new(filter_directives(&log_level, crates))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(env_filter),
        )
        .try_init();
}
