//! Flat-file persistence for input, snapshots, final output and run log.
//!
//! Every write goes through a temp file in the destination directory which is
//! then renamed over the target, so readers only ever see complete files.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};
use tempfile::NamedTempFile;

use super::clock::{Clock, SystemClock};
use super::records::RunLog;
use crate::error::{RedlineError, Result};

/// Header timestamp format
const HEADER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Per-run snapshot directory name format
const RUN_DIR_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Locations the store reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub input: PathBuf,
    pub output: PathBuf,
    pub intermediate_dir: PathBuf,
    pub run_log: PathBuf,
}

impl StorePaths {
    /// Standard layout under a base directory
    pub fn under(base_dir: impl AsRef<Path>) -> Self {
        let base = base_dir.as_ref();
        Self {
            input: base.join("input.md"),
            output: base.join("output.md"),
            intermediate_dir: base.join("intermediate"),
            run_log: base.join("processing_log.json"),
        }
    }
}

/// Snapshot file name for a step: `03_flow_and_polish.md`
///
/// Path separators in the display name become `_`, so the result is always a
/// single file directly inside the snapshot directory.
pub fn snapshot_file_name(step: usize, name: &str) -> String {
    let clean: String = name
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '-' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    format!("{:02}_{}.md", step, clean)
}

/// Reads the input document and persists everything a run produces.
pub struct DocumentStore {
    paths: StorePaths,
    clock: Box<dyn Clock>,
}

impl DocumentStore {
    /// Create a store using the wall clock
    pub fn new(paths: StorePaths) -> Self {
        Self::with_clock(paths, Box::new(SystemClock))
    }

    /// Create a store with an explicit time source
    pub fn with_clock(paths: StorePaths, clock: Box<dyn Clock>) -> Self {
        Self { paths, clock }
    }

    /// Put snapshots in a subdirectory named after the current time so
    /// earlier runs are not overwritten. Nothing is created until the first
    /// snapshot is saved.
    pub fn with_snapshot_history(mut self) -> Self {
        let run_dir = self.clock.now().format(RUN_DIR_FORMAT).to_string();
        self.paths.intermediate_dir = self.paths.intermediate_dir.join(run_dir);
        self
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Read and trim the input document
    pub fn load_initial_document(&self) -> Result<String> {
        let path = &self.paths.input;
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RedlineError::InputMissing(path.clone())
            } else {
                RedlineError::Io(e)
            }
        })?;
        Ok(content.trim().to_string())
    }

    /// Write the snapshot for a completed step and return its path
    pub fn save_intermediate(&self, step: usize, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.paths.intermediate_dir.join(snapshot_file_name(step, name));
        let rendered = format!(
            "# Step {}: {}\n\n*Processed at: {}*\n\n---\n\n{}",
            step,
            name,
            self.timestamp(),
            content
        );
        write_atomic(&path, &rendered)?;
        debug!("Saved snapshot for step {} to {}", step, path.display());
        Ok(path)
    }

    /// Write the final document, replacing any previous output
    pub fn save_final(&self, content: &str) -> Result<()> {
        write_atomic(&self.paths.output, &self.render_final(content))?;
        info!("Saved final output to {}", self.paths.output.display());
        Ok(())
    }

    /// Write the run log as pretty JSON, replacing any previous log
    pub fn write_run_log(&self, log: &RunLog) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(log)?;
        write_atomic(&self.paths.run_log, &json)?;
        info!("Saved run log to {}", self.paths.run_log.display());
        Ok(self.paths.run_log.clone())
    }

    /// Write the final document and the run log together.
    ///
    /// Both are fully written to temp files before either is renamed into
    /// place, so a failure while preparing them leaves the previous output
    /// and log untouched.
    pub fn commit_final(&self, content: &str, log: &RunLog) -> Result<()> {
        let json = serde_json::to_string_pretty(log)?;
        let output = prepare(&self.paths.output, &self.render_final(content))?;
        let run_log = prepare(&self.paths.run_log, &json)?;

        persist(output, &self.paths.output)?;
        info!("Saved final output to {}", self.paths.output.display());
        persist(run_log, &self.paths.run_log)?;
        info!("Saved run log to {}", self.paths.run_log.display());
        Ok(())
    }

    fn render_final(&self, content: &str) -> String {
        format!(
            "# Processed Output\n\n*Final processing completed at: {}*\n\n---\n\n{}",
            self.timestamp(),
            content
        )
    }

    fn timestamp(&self) -> String {
        self.clock.now().format(HEADER_TIME_FORMAT).to_string()
    }
}

/// Write `content` to `path` via a sibling temp file and rename.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp = prepare(path, content)?;
    persist(tmp, path)
}

/// Write `content` to a synced temp file next to `path`.
fn prepare(path: &Path, content: &str) -> Result<NamedTempFile> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

fn persist(tmp: NamedTempFile, path: &Path) -> Result<()> {
    tmp.persist(path)
        .map_err(|e| RedlineError::Storage(format!("Failed to persist {}: {}", path.display(), e.error)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FixedClock;
    use chrono::{Local, TimeZone};
    use tempfile::TempDir;

    fn fixed_store(temp_dir: &TempDir) -> DocumentStore {
        let ts = Local.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        DocumentStore::with_clock(StorePaths::under(temp_dir.path()), Box::new(FixedClock(ts)))
    }

    #[test]
    fn test_snapshot_file_name() {
        assert_eq!(snapshot_file_name(1, "Basic Typo Reviewer"), "01_basic_typo_reviewer.md");
        assert_eq!(snapshot_file_name(3, "Flow-and Polish"), "03_flow_and_polish.md");
        assert_eq!(snapshot_file_name(12, "SEO Reviewer"), "12_seo_reviewer.md");
    }

    #[test]
    fn test_snapshot_file_name_strips_separators() {
        assert_eq!(snapshot_file_name(2, "Flow/Polish"), "02_flow_polish.md");
        assert_eq!(snapshot_file_name(1, "../../escaped"), "01_.._.._escaped.md");
        assert_eq!(snapshot_file_name(4, "a\\b"), "04_a_b.md");
    }

    #[test]
    fn test_save_intermediate_stays_in_snapshot_dir() {
        let temp_dir = TempDir::new().unwrap();
        let store = fixed_store(&temp_dir);
        let intermediate = temp_dir.path().join("intermediate");

        let first = store.save_intermediate(1, "../../escaped", "one").unwrap();
        let second = store.save_intermediate(2, "Flow/Polish", "two").unwrap();
        let third = store.save_intermediate(3, "../../escaped", "three").unwrap();

        for path in [&first, &second, &third] {
            assert_eq!(path.parent().unwrap(), intermediate);
            assert!(path.is_file());
        }
        assert_ne!(first, third);
        assert!(!temp_dir.path().join("escaped.md").exists());
        assert!(!intermediate.join("escaped.md").exists());
        assert_eq!(fs::read_dir(&intermediate).unwrap().count(), 3);
    }

    #[test]
    fn test_load_initial_document_trims() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("input.md"), "\n  helo wrold \n\n").unwrap();

        let store = fixed_store(&temp_dir);
        assert_eq!(store.load_initial_document().unwrap(), "helo wrold");
    }

    #[test]
    fn test_load_initial_document_missing() {
        let temp_dir = TempDir::new().unwrap();
        let store = fixed_store(&temp_dir);

        match store.load_initial_document() {
            Err(RedlineError::InputMissing(path)) => assert!(path.ends_with("input.md")),
            other => panic!("Expected InputMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_save_intermediate_creates_dir_and_header() {
        let temp_dir = TempDir::new().unwrap();
        let store = fixed_store(&temp_dir);

        let path = store.save_intermediate(2, "UK English Standardiser", "colour").unwrap();
        assert_eq!(path, temp_dir.path().join("intermediate").join("02_uk_english_standardiser.md"));

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "# Step 2: UK English Standardiser\n\n*Processed at: 2025-03-04 05:06:07*\n\n---\n\ncolour"
        );
    }

    #[test]
    fn test_save_intermediate_overwrites_same_step() {
        let temp_dir = TempDir::new().unwrap();
        let store = fixed_store(&temp_dir);

        store.save_intermediate(1, "Headings", "first").unwrap();
        let path = store.save_intermediate(1, "Headings", "second").unwrap();
        assert!(fs::read_to_string(path).unwrap().ends_with("second"));

        let entries: Vec<_> = fs::read_dir(temp_dir.path().join("intermediate")).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_save_final() {
        let temp_dir = TempDir::new().unwrap();
        let store = fixed_store(&temp_dir);
        fs::write(temp_dir.path().join("output.md"), "stale").unwrap();

        store.save_final("done").unwrap();
        let written = fs::read_to_string(temp_dir.path().join("output.md")).unwrap();
        assert_eq!(
            written,
            "# Processed Output\n\n*Final processing completed at: 2025-03-04 05:06:07*\n\n---\n\ndone"
        );
    }

    #[test]
    fn test_write_run_log() {
        let temp_dir = TempDir::new().unwrap();
        let store = fixed_store(&temp_dir);
        let log = RunLog::new(
            store.clock().now(),
            &store.paths().input,
            &store.paths().output,
            vec![],
            "body",
        );

        let path = store.write_run_log(&log).unwrap();
        let restored: RunLog = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(restored.total_steps, 0);
        assert_eq!(restored.output_sha256, log.output_sha256);
    }

    #[test]
    fn test_commit_final_writes_both() {
        let temp_dir = TempDir::new().unwrap();
        let store = fixed_store(&temp_dir);
        let log = RunLog::new(store.clock().now(), &store.paths().input, &store.paths().output, vec![], "done");

        store.commit_final("done", &log).unwrap();
        assert!(fs::read_to_string(&store.paths().output).unwrap().ends_with("---\n\ndone"));
        let restored: RunLog = serde_json::from_str(&fs::read_to_string(&store.paths().run_log).unwrap()).unwrap();
        assert_eq!(restored.output_sha256, log.output_sha256);
    }

    #[test]
    fn test_commit_final_unwritable_log_keeps_previous_output() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        fs::write(temp_dir.path().join("output.md"), "previous").unwrap();

        let mut paths = StorePaths::under(temp_dir.path());
        paths.run_log = blocker.join("processing_log.json");
        let ts = Local.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        let store = DocumentStore::with_clock(paths, Box::new(FixedClock(ts)));
        let log = RunLog::new(store.clock().now(), &store.paths().input, &store.paths().output, vec![], "new");

        assert!(store.commit_final("new", &log).is_err());
        assert_eq!(fs::read_to_string(temp_dir.path().join("output.md")).unwrap(), "previous");
        let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let store = fixed_store(&temp_dir);

        store.save_intermediate(1, "Headings", "a").unwrap();
        store.save_intermediate(2, "Proofreader", "b").unwrap();

        let mut names: Vec<String> = fs::read_dir(temp_dir.path().join("intermediate"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["01_headings.md", "02_proofreader.md"]);
    }

    #[test]
    fn test_snapshot_history_uses_run_dir() {
        let temp_dir = TempDir::new().unwrap();
        let store = fixed_store(&temp_dir).with_snapshot_history();

        assert_eq!(
            store.paths().intermediate_dir,
            temp_dir.path().join("intermediate").join("20250304-050607")
        );
        assert!(!store.paths().intermediate_dir.exists());

        let path = store.save_intermediate(1, "Headings", "x").unwrap();
        assert!(path.starts_with(temp_dir.path().join("intermediate").join("20250304-050607")));
    }
}
