use std::fs::{OpenOptions, create_dir_all};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use mockgraph_generate::{GenerateOptions, run_dir};
use serde::Serialize;

use crate::CliError;

/// Config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig<'a> {
    pub run_id: &'a str,
    pub started_at: String,
    pub domains: &'a [String],
    pub options: &'a GenerateOptions,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub logs_path: PathBuf,
}

/// Create the run directory, write `config.json` and an empty log file.
pub fn start_run(
    run_id: &str,
    started_at: DateTime<Utc>,
    domains: &[String],
    options: &GenerateOptions,
) -> Result<RunPaths, CliError> {
    let root = run_dir(&options.out_dir, started_at, run_id);
    create_dir_all(&root)?;

    let config = RunConfig {
        run_id,
        started_at: started_at.to_rfc3339(),
        domains,
        options,
    };
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(root.join("config.json"))?;
    serde_json::to_writer_pretty(file, &config)?;

    let logs_path = root.join("logs.ndjson");
    OpenOptions::new().create(true).append(true).open(&logs_path)?;

    Ok(RunPaths { root, logs_path })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn start_run_writes_config_and_log_file() {
        let out_dir = std::env::temp_dir().join(format!("mockgraph_cli_{}", uuid::Uuid::new_v4()));
        let options = GenerateOptions {
            out_dir: out_dir.clone(),
            seed: 5,
            ..GenerateOptions::default()
        };
        let domains = vec!["venue".to_string()];
        let started_at = Utc
            .with_ymd_and_hms(2025, 3, 4, 5, 6, 7)
            .single()
            .expect("valid timestamp");
        let paths = start_run("run-1", started_at, &domains, &options).expect("run starts");

        assert_eq!(paths.root, out_dir.join("2025-03-04T05-06-07Z__run_run-1"));
        assert!(paths.logs_path.exists());
        let config: serde_json::Value = serde_json::from_slice(
            &std::fs::read(paths.root.join("config.json")).expect("config written"),
        )
        .expect("config is json");
        assert_eq!(config["run_id"], "run-1");
        assert_eq!(config["options"]["seed"], 5);
        assert_eq!(config["domains"][0], "venue");

        std::fs::remove_dir_all(out_dir).expect("cleanup");
    }
}
