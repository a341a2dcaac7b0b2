// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Result sink selection.
//!
//! An explicit output file is opened for appending. Without one, or when it
//! cannot be opened, results go to the controlling terminal and finally to
//! standard error. Standard output is left to the measured command.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

const TTY_PATH: &str = "/dev/tty";

/// Where the report is written.
pub enum Sink {
    File(File),
    Terminal(File),
    Stderr(io::Stderr),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::File(f) | Self::Terminal(f) => f.write(buf),
            Self::Stderr(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::File(f) | Self::Terminal(f) => f.flush(),
            Self::Stderr(s) => s.flush(),
        }
    }
}

fn append(path: &Path) -> io::Result<File> {
    OpenOptions::new().append(true).create(true).open(path)
}

/// Open the first usable sink. Never fails.
pub fn open(path: Option<&Path>) -> Sink {
    if let Some(path) = path {
        match append(path) {
            Ok(file) => return Sink::File(file),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot open output file");
            }
        }
    }

    match OpenOptions::new().write(true).open(TTY_PATH) {
        Ok(tty) => Sink::Terminal(tty),
        Err(e) => {
            tracing::debug!(error = %e, "No controlling terminal, writing to stderr");
            Sink::Stderr(io::stderr())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_file_is_appended() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.txt");
        std::fs::write(&path, "earlier\n").unwrap();

        let mut sink = open(Some(&path));
        assert!(matches!(sink, Sink::File(_)));
        writeln!(sink, "later").unwrap();
        sink.flush().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "earlier\nlater\n");
    }

    #[test]
    fn test_output_file_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("new.txt");

        let sink = open(Some(&path));
        assert!(matches!(sink, Sink::File(_)));
        assert!(path.exists());
    }

    #[test]
    fn test_unwritable_output_falls_back() {
        let sink = open(Some(Path::new("/nonexistent/dir/results.txt")));
        assert!(matches!(sink, Sink::Terminal(_) | Sink::Stderr(_)));
    }
}
