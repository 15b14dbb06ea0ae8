//! Launcher logging/panic-hook setup, mirroring `ox-bin::main`'s
//! `configure_logging`/`install_panic_hook` pair: a non-rotating file
//! appender plus a non-blocking writer whose `WorkerGuard` must outlive the
//! process, and a panic hook installed at most once.

use std::path::Path;
use std::sync::Once;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Configures a file-backed subscriber under `log_dir/clink.log`. The
/// returned guard must be held for the process's lifetime; dropping it
/// stops the background flush thread before buffered lines are written.
pub fn configure_logging(log_dir: &Path) -> WorkerGuard {
    let log_path = log_dir.join("clink.log");
    let _ = std::fs::remove_file(&log_path);
    let appender = tracing_appender::rolling::never(log_dir, "clink.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(writer)
        .try_init();

    guard
}

/// Wraps the default panic hook with a `tracing::error!` call so a panic
/// inside the host shell process still leaves a trace in the log file.
/// Installing it more than once would chain hooks pointlessly, hence the
/// `Once` guard.
pub fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target = "runtime.panic", %info, "panic");
            default_hook(info);
        }));
    });
}
