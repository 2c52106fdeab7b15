//! Append-only log file writer.

use std::fs::{self, File, OpenOptions};
use std::sync::Mutex;

use crate::logger::{FileConfig, LoggerError};

/// Opens the configured log file, creating parent directories.
///
/// The returned `Mutex<File>` is a `MakeWriter` for `tracing-subscriber`.
pub(crate) fn open_log_file(config: &FileConfig) -> Result<Mutex<File>, LoggerError> {
    if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(config.append)
        .truncate(!config.append)
        .open(&config.path)?;

    Ok(Mutex::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::LogFormat;
    use std::io::Write;

    #[test]
    fn test_creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/app.log");
        let config = FileConfig::new(true, path.clone(), true, LogFormat::Full).unwrap();

        let writer = open_log_file(&config).unwrap();
        writeln!(writer.lock().unwrap(), "hello").unwrap();

        assert_eq!(fs::read_to_string(path).unwrap(), "hello\n");
    }

    #[test]
    fn test_truncates_when_not_appending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "old line\n").unwrap();

        let config = FileConfig::new(true, path.clone(), false, LogFormat::Full).unwrap();
        let writer = open_log_file(&config).unwrap();
        writeln!(writer.lock().unwrap(), "new").unwrap();

        assert_eq!(fs::read_to_string(path).unwrap(), "new\n");
    }
}
