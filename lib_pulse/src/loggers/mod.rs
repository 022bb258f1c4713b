//! # Loggers
//!
//! `fern` based logging shared by the workspace binaries: every record goes to stdout and to a
//! timestamped file under the log directory. Older files of the same application are pruned
//! on start, keeping only the newest.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Result;

/// Installs the global logger for `app_name`. Returns the path of the new log file.
///
/// Fails if a logger was already installed in this process.
pub fn setup_logging(log_dir: &Path, log_level: &str, app_name: &str) -> Result<PathBuf> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)?;
    }

    // Keep only the most recent file of a previous run, then add ours.
    cleanup_old_logs(log_dir, app_name, 1)?;

    let log_file_name = format!(
        "{}_{}.log",
        app_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = log_dir.join(log_file_name);

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(parse_level(log_level))
        .chain(std::io::stdout())
        .chain(fern::log_file(&log_path)?)
        .apply()?;

    Ok(log_path)
}

/// Maps a level name to a filter; unknown names mean `info`.
pub fn parse_level(log_level: &str) -> log::LevelFilter {
    match log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "warn" => log::LevelFilter::Warn,
        "error" | "fatal" => log::LevelFilter::Error,
        "off" => log::LevelFilter::Off,
        _ => log::LevelFilter::Info,
    }
}

/// Deletes `<app_name>_*.log` files in `log_dir` except the `keep` newest. Returns how many
/// were removed.
pub fn cleanup_old_logs(log_dir: &Path, app_name: &str, keep: usize) -> Result<usize> {
    let prefix = format!("{}_", app_name);
    let mut entries: Vec<(SystemTime, PathBuf)> = fs::read_dir(log_dir)?
        .filter_map(|res| res.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "log"))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix))
        })
        .map(|p| {
            let modified = fs::metadata(&p)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, p)
        })
        .collect();

    // Newest first; equal times fall back to the name, which embeds the start time.
    entries.sort_by(|a, b| b.cmp(a));

    let mut removed = 0;
    for (_, path) in entries.iter().skip(keep) {
        match fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!("Failed to delete old log file {:?}: {}", path, e),
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn cleanup_keeps_newest_of_same_app_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "pulse_2024-01-01_00-00-00.log",
            "pulse_2024-01-02_00-00-00.log",
            "pulse_2024-01-03_00-00-00.log",
            "other_2024-01-01_00-00-00.log",
            "pulse_notes.txt",
        ] {
            File::create(dir.path().join(name)).unwrap();
        }

        let removed = cleanup_old_logs(dir.path(), "pulse", 1).unwrap();
        assert_eq!(removed, 2);

        let mut left: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        left.sort();
        assert_eq!(left.len(), 3);
        assert!(left.contains(&"other_2024-01-01_00-00-00.log".to_string()));
        assert!(left.contains(&"pulse_notes.txt".to_string()));
        assert_eq!(left.iter().filter(|n| n.starts_with("pulse_2024")).count(), 1);
    }

    #[test]
    fn cleanup_on_empty_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(cleanup_old_logs(dir.path(), "pulse", 1).unwrap(), 0);
    }

    #[test]
    fn level_names() {
        assert_eq!(parse_level("DEBUG"), log::LevelFilter::Debug);
        assert_eq!(parse_level("fatal"), log::LevelFilter::Error);
        assert_eq!(parse_level("whatever"), log::LevelFilter::Info);
    }
}
