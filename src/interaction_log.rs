use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};

const RECORD_SEPARATOR_WIDTH: usize = 40;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Append-only question/answer transcript.
///
/// Each record is rendered in full and written with one `write_all` while the
/// writer lock is held, so records from concurrent requests never interleave.
#[derive(Debug)]
pub struct InteractionLog {
    path: PathBuf,
    writer: Mutex<()>,
}

impl InteractionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, question: &str, answer: &str) -> io::Result<()> {
        self.record_at(Local::now(), question, answer)
    }

    fn record_at(&self, time: DateTime<Local>, question: &str, answer: &str) -> io::Result<()> {
        let entry = format_record(time, question, answer);
        let _guard = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.as_bytes())?;
        file.flush()
    }
}

fn format_record(time: DateTime<Local>, question: &str, answer: &str) -> String {
    format!(
        "Time: {}\nQ: {}\nA: {}\n{}\n",
        time.format(TIMESTAMP_FORMAT),
        question,
        answer,
        "-".repeat(RECORD_SEPARATOR_WIDTH)
    )
}
