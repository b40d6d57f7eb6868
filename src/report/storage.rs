use super::types::{ReportStore, STORE_VERSION};
use crate::grade::{GradeSession, GradeSlot};
use crate::scoring::ScoringConfig;
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use serde_json::Value;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Get the default report store path (~/.config/drill-grade/reports.json)
pub fn get_reports_path() -> PathBuf {
    crate::config::get_config_dir().join("reports.json")
}

/// Load the report store from a JSON file
///
/// If the file doesn't exist, returns a new empty store.
/// If the file exists but has an unsupported version, returns an error.
pub fn load_store(path: &Path) -> Result<ReportStore> {
    if !path.exists() {
        debug!(path = %path.display(), "no report store yet, starting empty");
        return Ok(ReportStore::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open report store at {}", path.display()))?;

    let store: ReportStore = serde_json::from_reader(file)
        .with_context(|| format!("Failed to load report store from {}", path.display()))?;

    if store.version != STORE_VERSION {
        anyhow::bail!("Unsupported report store version: {}", store.version);
    }

    debug!(path = %path.display(), reports = store.reports.len(), "report store loaded");
    Ok(store)
}

/// Load the stored reports as untyped JSON documents.
///
/// Analytics read documents this way so that legacy grade encodings are
/// coerced field by field instead of rejecting the whole store.
pub fn load_documents(path: &Path) -> Result<Vec<Value>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open report store at {}", path.display()))?;
    let root: Value = serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse report store at {}", path.display()))?;

    let documents = match root.get("reports") {
        Some(Value::Array(reports)) => reports.clone(),
        _ => Vec::new(),
    };
    Ok(documents)
}

/// Save the report store to a JSON file atomically
///
/// Uses atomic-write-file to ensure the file is never left in a corrupted state.
/// Creates the parent directory if it doesn't exist.
pub fn save_store(path: &Path, store: &ReportStore) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, store).context("Failed to serialize report store")?;

    file.commit().context("Failed to save report store")?;

    debug!(path = %path.display(), reports = store.reports.len(), "report store saved");
    Ok(())
}

/// Open the grade in `slot` of report `id`, apply `edit` and save the store.
///
/// An empty slot starts from a fresh catalog. Returns `None` when the report
/// does not exist. The result of `edit` is only handed back after the store
/// is written; a failed edit or save leaves the file untouched.
pub fn update_grade<F, T>(
    path: &Path,
    id: u64,
    slot: GradeSlot,
    config: &ScoringConfig,
    edit: F,
) -> Result<Option<(T, GradeSession)>>
where
    F: FnOnce(&mut GradeSession) -> Result<T>,
{
    let mut store = load_store(path)?;
    let Some(report) = store.get_mut(id) else {
        return Ok(None);
    };

    let mut session = match report.grade(slot) {
        Some(grade) => GradeSession::from_grade(grade.clone(), config.clone()),
        None => GradeSession::new("", config.clone()),
    };
    let outcome = edit(&mut session)?;

    report.set_grade(slot, session.grade().clone());
    save_store(path, &store)?;
    debug!(id, slot = slot.label(), "grade updated");
    Ok(Some((outcome, session)))
}
