use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Whether log output should carry ANSI colors.
pub fn use_color(no_color: bool, force_color: bool) -> bool {
    if no_color {
        return false;
    }
    force_color || std::io::stderr().is_terminal()
}

/// Install the stderr subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init(ansi: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(std::io::stderr)
        .init();
}
