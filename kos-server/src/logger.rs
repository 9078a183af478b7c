//! Logging setup
//!
//! `RUST_LOG` controls filtering (default `kos_server=info,tower_http=info`).
//! `LOG_FORMAT=json` switches to JSON lines; `LOG_DIR` adds a daily rolling file.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

const DEFAULT_FILTER: &str = "kos_server=info,tower_http=info";

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the process so buffered file output is flushed.
pub fn init_logger(log_format: Option<&str>, log_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let json = log_format.is_some_and(|f| f.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_dir {
        Some(dir) if std::fs::create_dir_all(dir).is_ok() => {
            let appender = tracing_appender::rolling::daily(dir, "kos-server.log");
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            let writer = std::io::stdout.and(file_writer);
            if json {
                builder.json().with_writer(writer).init();
            } else {
                builder.with_writer(writer).init();
            }
            Some(guard)
        }
        _ => {
            if json {
                builder.json().init();
            } else {
                builder.init();
            }
            None
        }
    }
}
