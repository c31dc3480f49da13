use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

const DEFAULT_LOG_FILTER: &str = "warn,askbot=info";
const DEFAULT_LOG_FILE_PATH: &str = "logs/askbot.log";
const DEFAULT_LOG_FILE_NAME: &str = "askbot.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

type InitResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum LogOutput {
    #[default]
    Stderr,
    File,
    Both,
}

/// Diagnostic logging switches read from `LOG_FORMAT`, `LOG_OUTPUT` and
/// `LOG_FILE_PATH`. The filter itself comes from `RUST_LOG`.
#[derive(Clone, Debug, PartialEq, Eq)]
struct LoggingSettings {
    format: LogFormat,
    output: LogOutput,
    file_path: PathBuf,
}

impl LoggingSettings {
    fn from_vars(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        let format = match normalized(get_var("LOG_FORMAT").as_deref()).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::default(),
        };
        let output = match normalized(get_var("LOG_OUTPUT").as_deref()).as_deref() {
            Some("file") => LogOutput::File,
            Some("both") => LogOutput::Both,
            _ => LogOutput::default(),
        };
        let file_path = get_var("LOG_FILE_PATH")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE_PATH));

        Self {
            format,
            output,
            file_path,
        }
    }
}

fn normalized(raw: Option<&str>) -> Option<String> {
    raw.map(|value| value.trim().to_ascii_lowercase())
}

fn build_file_writer(path: &Path) -> std::io::Result<(non_blocking::NonBlocking, WorkerGuard)> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| std::ffi::OsStr::new(DEFAULT_LOG_FILE_NAME));

    fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

fn env_filter_from_env() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn init_with_writer(format: LogFormat, writer: BoxMakeWriter) -> InitResult {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(env_filter_from_env())
            .with_writer(writer)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter_from_env())
            .with_writer(writer)
            .try_init(),
    }
}

fn init_file_output(settings: &LoggingSettings) -> InitResult {
    let include_stderr = settings.output == LogOutput::Both;

    match build_file_writer(&settings.file_path) {
        Ok((file_writer, guard)) => {
            let writer = if include_stderr {
                BoxMakeWriter::new(std::io::stderr.and(file_writer))
            } else {
                BoxMakeWriter::new(file_writer)
            };

            let init_result = init_with_writer(settings.format, writer);
            if init_result.is_ok() {
                let _ = LOG_GUARD.set(guard);
            }
            init_result
        }
        Err(err) => {
            let (mode, fallback) = if include_stderr {
                ("both", "using stderr only")
            } else {
                ("file", "using stderr instead")
            };
            eprintln!(
                "askbot: failed to initialize LOG_OUTPUT={} at '{}': {}; {}",
                mode,
                settings.file_path.display(),
                err,
                fallback
            );
            init_with_writer(settings.format, BoxMakeWriter::new(std::io::stderr))
        }
    }
}

/// Installs the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init() {
    let settings = LoggingSettings::from_vars(|key| env::var(key).ok());

    let _ = match settings.output {
        LogOutput::Stderr => init_with_writer(settings.format, BoxMakeWriter::new(std::io::stderr)),
        LogOutput::File | LogOutput::Both => init_file_output(&settings),
    };
}
