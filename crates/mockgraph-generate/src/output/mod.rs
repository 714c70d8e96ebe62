//! Persistence of generated tables.

pub mod json;

use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use mockgraph_core::{GenerationError, Result, Table};

use crate::model::OutputFormat;

/// Write `table` into `dir` as `<table>.<ext>` and return the bytes written.
///
/// Data lands in a `.tmp` sibling first and is renamed into place once
/// complete, so an interrupted write never leaves a partial table file.
pub fn write_table(dir: &Path, table: &Table, format: OutputFormat) -> Result<u64> {
    std::fs::create_dir_all(dir)?;
    let path = table_path(dir, table.name(), format);
    let tmp_path = temp_path(&path)?;

    let file = open_truncated(&tmp_path)?;
    let written = match format {
        OutputFormat::Json => json::write_array(BufWriter::new(file), table),
        OutputFormat::Jsonl => json::write_lines(BufWriter::new(file), table),
    };
    let bytes = match written {
        Ok(bytes) => bytes,
        Err(err) => {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(err);
        }
    };

    std::fs::rename(&tmp_path, &path)?;
    Ok(bytes)
}

/// Final path of a table file, whether or not it exists yet.
pub fn table_path(dir: &Path, table: &str, format: OutputFormat) -> PathBuf {
    dir.join(format!("{table}.{}", format.extension()))
}

fn open_truncated(path: &Path) -> Result<File> {
    Ok(OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?)
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        GenerationError::InvalidPlan(format!("invalid output path {}", path.display()))
    })?;
    let tmp_name = format!("{}.tmp", file_name.to_string_lossy());
    Ok(path.with_file_name(tmp_name))
}
