//! Diagnostics on stderr through `tracing`
//!
//! `RUST_LOG` wins when set; otherwise the level comes from the command line
//! verbosity. Stdout is left alone so transform output stays pipeable.

use tracing_subscriber::EnvFilter;

/// Filter level for a `-v` count, or `error` when quiet
pub fn level_for(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(verbosity: u8, quiet: bool) {
    let level = level_for(verbosity, quiet);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
