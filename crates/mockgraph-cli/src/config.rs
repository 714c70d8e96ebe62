use std::path::{Path, PathBuf};

use mockgraph_generate::{Domain, GenerateOptions, OutputFormat};

use crate::CliError;

/// Command-line values that override the config file when present.
#[derive(Debug, Default)]
pub struct Overrides {
    pub seed: Option<u64>,
    pub out: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub max_id_attempts: Option<u32>,
    pub counts: Vec<(String, usize)>,
    pub fail_fast: bool,
}

/// Load options from an optional TOML file, then apply `overrides`.
pub fn load_options(path: Option<&Path>, overrides: Overrides) -> Result<GenerateOptions, CliError> {
    let options = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            parse_options(&content)?
        }
        None => GenerateOptions::default(),
    };
    Ok(apply(options, overrides))
}

pub fn parse_options(content: &str) -> Result<GenerateOptions, CliError> {
    Ok(toml::from_str(content)?)
}

fn apply(mut options: GenerateOptions, overrides: Overrides) -> GenerateOptions {
    if let Some(seed) = overrides.seed {
        options.seed = seed;
    }
    if let Some(out) = overrides.out {
        options.out_dir = out;
    }
    if let Some(format) = overrides.format {
        options.format = format;
    }
    if let Some(attempts) = overrides.max_id_attempts {
        options.max_id_attempts = attempts;
    }
    options.counts.extend(overrides.counts);
    options.fail_fast |= overrides.fail_fast;
    options
}

/// Reject count overrides that name no table of the selected domains.
pub fn check_counts(options: &GenerateOptions, domains: &[Domain]) -> Result<(), CliError> {
    let has_table =
        |domain: &Domain, table: &str| domain.tables.iter().any(|spec| spec.name == table);
    for key in options.counts.keys() {
        let known = match key.split_once('.') {
            Some((domain, table)) => domains
                .iter()
                .any(|candidate| candidate.name == domain && has_table(candidate, table)),
            None => domains.iter().any(|candidate| has_table(candidate, key)),
        };
        if !known {
            return Err(CliError::UnknownTable(key.clone()));
        }
    }
    Ok(())
}

/// Parse a `table=N` or `domain.table=N` count override.
pub fn parse_count(value: &str) -> Result<(String, usize), String> {
    let (table, count) = value
        .split_once('=')
        .ok_or_else(|| format!("expected TABLE=N, got `{value}`"))?;
    let table = table.trim();
    if table.is_empty() {
        return Err(format!("missing table name in `{value}`"));
    }
    let count = count
        .trim()
        .parse::<usize>()
        .map_err(|err| format!("invalid count in `{value}`: {err}"))?;
    Ok((table.to_string(), count))
}
