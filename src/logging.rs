use cfg_if::cfg_if;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

/// Used when `RUST_LOG` is unset. The GPU stack is chatty at `info`.
const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        pub fn init() {
            // Log to browser console via tracing-wasm
            let wasm_layer = tracing_wasm::WASMLayer::new(tracing_wasm::WASMLayerConfig::default());

            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(wasm_layer)
                .try_init();

            // Panics with stacktrace
            #[cfg(feature = "console_error_panic_hook")]
            console_error_panic_hook::set_once();
        }
    } else {
        use once_cell::sync::OnceCell;
        use std::ffi::OsString;
        use std::path::{Path, PathBuf};
        use tracing_appender::non_blocking::WorkerGuard;
        use tracing_subscriber::fmt;

        static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

        /// Split `RUST_LOG_FILE` into the rolling appender's directory and file prefix.
        fn log_file_target(log_path: &str) -> (PathBuf, OsString) {
            let path = Path::new(log_path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let file = path.file_name().map(OsString::from).unwrap_or_else(|| "app.log".into());
            (dir.to_path_buf(), file)
        }

        fn panic_message(info: &std::panic::PanicHookInfo<'_>) -> String {
            let location = info
                .location()
                .map(|loc| format!("panic at {}:{}:{} ", loc.file(), loc.line(), loc.column()))
                .unwrap_or_default();
            let payload = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "<non-string panic>".to_string());
            location + &payload
        }

        pub fn init() {
            // Console (stderr) layer with file/line
            let console_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .compact();

            // Daily rolling file (RUST_LOG_FILE, default logs/app.log)
            let log_path = std::env::var("RUST_LOG_FILE").unwrap_or_else(|_| "logs/app.log".to_string());
            let (dir, file) = log_file_target(&log_path);
            let (nb_writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file));
            let _ = FILE_GUARD.set(guard);

            let file_layer = fmt::layer()
                .with_writer(nb_writer)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .compact();

            // Tests may call this more than once
            if tracing_subscriber::registry()
                .with(env_filter())
                .with(console_layer)
                .with(file_layer)
                .try_init()
                .is_err()
            {
                return;
            }

            // Hook panics to log with backtrace
            std::panic::set_hook(Box::new(|info| {
                let bt = std::backtrace::Backtrace::force_capture();
                tracing::error!("{}\nBacktrace:\n{:?}", panic_message(info), bt);
            }));
        }

        #[cfg(test)]
        mod tests {
            use super::*;

            #[test]
            fn log_path_splits_into_dir_and_prefix() {
                let (dir, file) = log_file_target("logs/app.log");
                assert_eq!(dir, PathBuf::from("logs"));
                assert_eq!(file, OsString::from("app.log"));
            }

            #[test]
            fn bare_file_name_logs_to_working_dir() {
                let (dir, file) = log_file_target("ramen.log");
                assert_eq!(dir, PathBuf::from("."));
                assert_eq!(file, OsString::from("ramen.log"));
            }
        }
    }
}
