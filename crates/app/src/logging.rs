use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Output goes to `log_file` (appended)
/// unless `to_stderr` is set; `RUST_LOG` overrides the `info` default.
pub fn init(log_file: &Path, to_stderr: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if to_stderr {
        builder.with_writer(std::io::stderr).init();
        return Ok(());
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("opening log file {}", log_file.display()))?;
    builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    Ok(())
}
