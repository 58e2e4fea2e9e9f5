use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Targets that receive the CLI-selected level
const TARGETS: [&str; 5] = [
    "rubrica",
    "rubrica_core",
    "rubrica_lmstudio",
    "rubrica_batch",
    "rubrica_cli",
];

/// Environment variable read when no `--log-level` is given
pub const LOG_ENV: &str = "RUBRICA_LOG";

/// Initialize the tracing subscriber
///
/// Precedence: `--log-level`, then `RUBRICA_LOG`, then `RUST_LOG`, then
/// `--verbose` (debug). The default is `warn`. Events go to stderr so they
/// never mix with the evaluation output.
pub fn init_tracing(verbose: bool, log_level: Option<&str>) -> Result<()> {
    let fallback = directive(if verbose { "debug" } else { "warn" });
    let chosen = select_directive(log_level, |key| std::env::var(key).ok());
    let filter = chosen
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()?;

    Ok(())
}

/// The explicit level if given, otherwise the first environment override
fn select_directive(
    log_level: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    if let Some(level) = log_level {
        return Some(directive(level));
    }
    env(LOG_ENV)
        .or_else(|| env("RUST_LOG"))
        .filter(|value| !value.trim().is_empty())
}

/// Filter directive for a bare level; full directives pass through
fn directive(level: &str) -> String {
    if level.contains('=') {
        return level.to_string();
    }
    TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}
