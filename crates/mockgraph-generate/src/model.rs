use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::DEFAULT_MAX_ATTEMPTS;

/// Options for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Directory where run artifacts are written.
    pub out_dir: PathBuf,
    /// Run seed; per-table seeds are derived from it.
    pub seed: u64,
    pub format: OutputFormat,
    /// Retry ceiling for identifier allocation.
    pub max_id_attempts: u32,
    /// Record-count overrides keyed by `table` or `domain.table`.
    pub counts: BTreeMap<String, usize>,
    /// Stop at the first failed table instead of continuing.
    pub fail_fast: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("out"),
            seed: 42,
            format: OutputFormat::Json,
            max_id_attempts: DEFAULT_MAX_ATTEMPTS,
            counts: BTreeMap::new(),
            fail_fast: false,
        }
    }
}

impl GenerateOptions {
    /// Count override for a table, preferring the domain-qualified key.
    pub fn count_override(&self, domain: &str, table: &str) -> Option<usize> {
        self.counts
            .get(&format!("{domain}.{table}"))
            .or_else(|| self.counts.get(table))
            .copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Single pretty-printed array document.
    #[default]
    Json,
    /// One record per line.
    Jsonl,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" => Ok(OutputFormat::Jsonl),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Generated,
    Failed,
    /// Not attempted because a parent failed or the run stopped early.
    Skipped,
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            TableStatus::Generated => "generated",
            TableStatus::Failed => "failed",
            TableStatus::Skipped => "skipped",
        })
    }
}

/// Summary of a single table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub domain: String,
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub rows_requested: u64,
    pub rows_generated: u64,
    pub status: TableStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub bytes_written: u64,
    pub duration_ms: u64,
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub seed: u64,
    pub tables: Vec<TableReport>,
    pub bytes_written: u64,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn new(run_id: String, seed: u64) -> Self {
        Self {
            run_id,
            seed,
            tables: Vec::new(),
            bytes_written: 0,
            duration_ms: 0,
        }
    }

    pub fn failed_count(&self) -> usize {
        self.tables
            .iter()
            .filter(|table| table.status != TableStatus::Generated)
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn table(&self, domain: &str, table: &str) -> Option<&TableReport> {
        self.tables
            .iter()
            .find(|report| report.domain == domain && report.table == table)
    }
}
