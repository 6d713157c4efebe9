use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt,
    layer::{Layer, SubscriberExt},
};

/// Keeps the non-blocking writers alive for the lifetime of the process.
pub struct Logging {
    file_guard: Option<WorkerGuard>,
    stderr_guard: Option<WorkerGuard>,
}

impl Default for Logging {
    fn default() -> Self {
        Self::new()
    }
}

impl Logging {
    pub fn new() -> Self {
        Logging {
            file_guard: None,
            stderr_guard: None,
        }
    }

    /// Progress goes to stderr filtered by `RUST_LOG` (info by default),
    /// `quiet` silences it. A debug file, when given, receives everything.
    pub fn init(&mut self, quiet: bool, debug: &Option<PathBuf>) -> &mut Self {
        let mut layers = vec![];

        let (stderr_writer, stderr_guard) = tracing_appender::non_blocking(io::stderr());
        let stderr_filter = if quiet {
            EnvFilter::new("off")
        } else {
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy()
        };
        let stderr_layer = fmt::Layer::default()
            .with_target(false)
            .with_writer(stderr_writer)
            .with_filter(stderr_filter)
            .boxed();
        self.stderr_guard = Some(stderr_guard);
        layers.push(stderr_layer);

        if let Some(file_path) = debug {
            let _ = std::fs::remove_file(file_path);
            let file_appender = tracing_appender::rolling::never("", file_path);
            let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

            let file_layer = fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(non_blocking_file)
                .with_filter(LevelFilter::TRACE)
                .boxed();
            self.file_guard = Some(file_guard);
            layers.push(file_layer);
        }

        let subscriber = tracing_subscriber::registry().with(layers);
        if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Cannot set up logging: {error}");
        }

        self
    }
}
