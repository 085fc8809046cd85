// src/utils/log.rs
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Local};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only run log. Writes a `Started:` line on open and a
/// `Finished:` line with the elapsed time when dropped; in between,
/// one line per processed tile.
pub struct RunLog {
    file: File,
    started: DateTime<Local>,
}

impl RunLog {
    pub fn open(path: &Path) -> io::Result<Self> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let started = Local::now();
        writeln!(file, "Started: {}", started.format(TIME_FORMAT))?;
        file.flush()?;
        Ok(Self { file, started })
    }

    pub fn line(&mut self, msg: &str) {
        let _ = writeln!(self.file, "{msg}");
        let _ = self.file.flush();
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        let finished = Local::now();
        let elapsed = (finished - self.started).num_seconds().max(0);
        let _ = writeln!(
            self.file,
            "Finished: {}(total time {}:{:02}:{:02})",
            finished.format(TIME_FORMAT),
            elapsed / 3600,
            elapsed % 3600 / 60,
            elapsed % 60,
        );
        let _ = self.file.flush();
    }
}
