//! JSON scan reports.
//!
//! [`build_report`] assembles the snapshot without touching the filesystem;
//! [`write_report`] persists it.

use crate::core::error::{Error, Result};
use crate::core::types::{FileRecord, ScanStats, ScanTarget};
use crate::detection::SignatureTable;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Outcome of writing a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Engine state captured in a report.
pub struct ReportInput<'a> {
    pub threats: &'a [FileRecord],
    pub scan_directories: &'a [ScanTarget],
    pub signatures: &'a SignatureTable,
    pub stats: ScanStats,
}

/// Merge caller metadata with the current results.
///
/// Engine-owned keys overwrite caller keys of the same name.
pub fn build_report(mut extra: Map<String, Value>, input: ReportInput<'_>) -> Result<Value> {
    extra.insert("threats".to_string(), serde_json::to_value(input.threats)?);
    extra.insert(
        "scan_directories".to_string(),
        serde_json::to_value(input.scan_directories)?,
    );
    extra.insert(
        "known_cheats".to_string(),
        serde_json::to_value(input.signatures.display_names())?,
    );
    extra.insert("stats".to_string(), serde_json::to_value(input.stats)?);
    extra
        .entry("report_id".to_string())
        .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
    extra.insert(
        "generated_at".to_string(),
        Value::String(chrono::Utc::now().to_rfc3339()),
    );
    Ok(Value::Object(extra))
}

/// Write a report as pretty-printed JSON.
pub fn write_report(report: &Value, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::DirectoryAccess {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(output_path, json).map_err(|e| Error::file_write(output_path, e))
}

/// Default file name for an exported report.
pub fn default_report_name() -> String {
    format!("threat_scan_{}.json", chrono::Utc::now().timestamp())
}
