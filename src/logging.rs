use cfg_if::cfg_if;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        pub fn init() {
            let wasm_layer = tracing_wasm::WASMLayer::new(tracing_wasm::WASMLayerConfig::default());

            // try_init: a second call (hot reload) keeps the first subscriber
            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(wasm_layer)
                .try_init();

            #[cfg(feature = "console_error_panic_hook")]
            console_error_panic_hook::set_once();
        }
    } else {
        use std::path::{Path, PathBuf};
        use tracing_appender::non_blocking::WorkerGuard;
        use tracing_subscriber::fmt;
        use once_cell::sync::OnceCell;

        pub const DEFAULT_LOG_FILE: &str = "logs/sphere_hop.log";

        static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

        /// Split a log path into the rolling appender's directory and file prefix
        pub fn log_file_parts(log_path: &str) -> (PathBuf, PathBuf) {
            let path = Path::new(log_path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let file = path.file_name().map(Path::new).unwrap_or(Path::new("sphere_hop.log"));
            (dir.to_path_buf(), file.to_path_buf())
        }

        pub fn init() {
            let console_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_level(true)
                .compact();

            let log_path = std::env::var("RUST_LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
            let (dir, file) = log_file_parts(&log_path);
            let (nb_writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file));
            let _ = FILE_GUARD.set(guard);

            let file_layer = fmt::layer()
                .with_writer(nb_writer)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_level(true)
                .compact();

            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(console_layer)
                .with(file_layer)
                .try_init();

            std::panic::set_hook(Box::new(|info| {
                let mut msg = String::new();
                if let Some(loc) = info.location() {
                    msg.push_str(&format!("panic at {}:{}:{} ", loc.file(), loc.line(), loc.column()));
                }
                if let Some(s) = info.payload().downcast_ref::<&str>() { msg.push_str(s); }
                else if let Some(s) = info.payload().downcast_ref::<String>() { msg.push_str(s); }
                else { msg.push_str("<non-string panic>"); }
                let bt = std::backtrace::Backtrace::force_capture();
                tracing::error!("{}\nBacktrace:\n{:?}", msg, bt);
            }));
        }

        #[cfg(test)]
        mod tests {
            use super::*;

            #[test]
            fn test_log_file_parts() {
                assert_eq!(
                    log_file_parts("logs/sphere_hop.log"),
                    (PathBuf::from("logs"), PathBuf::from("sphere_hop.log"))
                );
                assert_eq!(log_file_parts("run.log"), (PathBuf::from("."), PathBuf::from("run.log")));
            }
        }
    }
}
