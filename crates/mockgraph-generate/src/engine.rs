use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use mockgraph_core::{GenerationError, Result, Table};

use crate::graph::{EntityGraphBuilder, ParentLink};
use crate::ids::IdAllocator;
use crate::model::{GenerateOptions, GenerationReport, TableReport, TableStatus};
use crate::output::write_table;
use crate::plan::{RecordCount, TableSpec};
use crate::sampler::Sampler;

/// A named set of tables generated together, parents before children.
#[derive(Debug, Clone)]
pub struct Domain {
    pub name: String,
    pub description: String,
    pub tables: Vec<TableSpec>,
}

impl Domain {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tables: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: TableSpec) -> Self {
        self.tables.push(table);
        self
    }

    pub fn table(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|table| table.name == name)
    }
}

/// Identifier namespaces and the seed shared by the tables of one domain.
#[derive(Debug)]
pub struct GenerationContext {
    ids: IdAllocator,
    seed: u64,
}

impl GenerationContext {
    pub fn new(seed: u64, max_id_attempts: u32) -> Self {
        Self {
            ids: IdAllocator::with_max_attempts(max_id_attempts),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate one table. Child specs must be given the parent table they
    /// name; the table's randomness depends only on the context seed and the
    /// table name.
    pub fn generate_table(&mut self, spec: &TableSpec, parent: Option<&Table>) -> Result<Table> {
        self.generate_table_with(spec, parent, &[])
    }

    /// Like [`GenerationContext::generate_table`], also supplying the tables
    /// read by `reference` steps.
    pub fn generate_table_with(
        &mut self,
        spec: &TableSpec,
        parent: Option<&Table>,
        references: &[&Table],
    ) -> Result<Table> {
        let link = match (&spec.parent, parent) {
            (None, None) => None,
            (Some(binding), Some(table)) => {
                if table.name() != binding.table {
                    return Err(GenerationError::InvalidPlan(format!(
                        "table '{}' expects parent '{}', got '{}'",
                        spec.name,
                        binding.table,
                        table.name()
                    )));
                }
                Some(ParentLink::new(table, binding.policy))
            }
            (Some(binding), None) => {
                return Err(GenerationError::InvalidPlan(format!(
                    "table '{}' requires parent table '{}'",
                    spec.name, binding.table
                )));
            }
            (None, Some(table)) => {
                return Err(GenerationError::InvalidPlan(format!(
                    "table '{}' does not link to parent '{}'",
                    spec.name,
                    table.name()
                )));
            }
        };

        let count = spec.resolve_count(link.map(|link| link.table.len()))?;
        let mut sampler = Sampler::seeded(hash_seed(self.seed, &spec.name));
        EntityGraphBuilder::new(&mut self.ids, &mut sampler)
            .with_references(references.iter().copied())
            .build(&spec.name, link, count, &spec.plan)
    }
}

/// Tables and per-table reports of one domain.
#[derive(Debug)]
pub struct DomainOutcome {
    pub domain: String,
    pub tables: Vec<Table>,
    pub reports: Vec<TableReport>,
}

impl DomainOutcome {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.name() == name)
    }

    pub fn report(&self, name: &str) -> Option<&TableReport> {
        self.reports.iter().find(|report| report.table == name)
    }

    pub fn is_success(&self) -> bool {
        self.reports
            .iter()
            .all(|report| report.status == TableStatus::Generated)
    }
}

/// Generates the tables of one domain in order, isolating failures.
///
/// A failed table is reported and dropped; tables that depend on it are
/// skipped while independent tables still run.
pub struct DomainRun<'a> {
    domain: &'a Domain,
    options: &'a GenerateOptions,
    run_id: Cow<'a, str>,
    halted: bool,
}

impl<'a> DomainRun<'a> {
    pub fn new(domain: &'a Domain, options: &'a GenerateOptions) -> Self {
        Self {
            domain,
            options,
            run_id: Cow::Borrowed("local"),
            halted: false,
        }
    }

    pub fn with_run_id(mut self, run_id: &'a str) -> Self {
        self.run_id = Cow::Borrowed(run_id);
        self
    }

    /// Skip every table, used once a fail-fast run has stopped.
    pub fn halted(mut self, halted: bool) -> Self {
        self.halted = halted;
        self
    }

    /// Generate every table, writing each into `out_dir` when given.
    pub fn execute(&self, out_dir: Option<&Path>) -> DomainOutcome {
        let domain = self.domain.name.as_str();
        let mut context = GenerationContext::new(
            hash_seed(self.options.seed, domain),
            self.options.max_id_attempts,
        );
        let mut tables: Vec<Table> = Vec::new();
        let mut reports: Vec<TableReport> = Vec::new();
        let mut halted = self.halted;

        for spec in &self.domain.tables {
            let spec = self.effective_spec(spec);
            let table_start = Instant::now();
            let mut report = TableReport {
                domain: domain.to_string(),
                table: spec.name.clone(),
                parent: spec.parent_table().map(str::to_string),
                rows_requested: 0,
                rows_generated: 0,
                status: TableStatus::Skipped,
                error: None,
                error_code: None,
                bytes_written: 0,
                duration_ms: 0,
            };

            if halted {
                report.error = Some("run stopped after an earlier failure".to_string());
                info!(run_id = %self.run_id, domain, table = %spec.name, "table skipped");
                reports.push(report);
                continue;
            }

            let mut missing = None;
            for dependency in spec.dependencies() {
                if tables.iter().any(|table| table.name() == dependency) {
                    continue;
                }
                missing = Some(
                    if reports.iter().any(|report| report.table == dependency) {
                        Missing::Failed(dependency.to_string())
                    } else {
                        Missing::Undeclared(dependency.to_string())
                    },
                );
                break;
            }
            match missing {
                Some(Missing::Failed(dependency)) => {
                    report.error = Some(format!("table '{dependency}' was not generated"));
                    warn!(
                        run_id = %self.run_id,
                        domain,
                        table = %spec.name,
                        dependency = %dependency,
                        "table skipped"
                    );
                    reports.push(report);
                    continue;
                }
                Some(Missing::Undeclared(dependency)) => {
                    let err = GenerationError::InvalidPlan(format!(
                        "table '{dependency}' is not declared before '{}'",
                        spec.name
                    ));
                    halted |= self.options.fail_fast;
                    reports.push(failed(report, &err, &self.run_id, table_start));
                    continue;
                }
                None => {}
            }

            let find = |name: &str| tables.iter().find(|table| table.name() == name);
            let parent = spec.parent_table().and_then(find);
            let references: Vec<&Table> = spec
                .plan
                .referenced_tables()
                .filter_map(find)
                .collect();

            report.rows_requested = spec
                .resolve_count(parent.map(Table::len))
                .unwrap_or_default() as u64;
            info!(
                run_id = %self.run_id,
                domain,
                table = %spec.name,
                rows = report.rows_requested,
                "generating table"
            );

            let generated = context
                .generate_table_with(&spec, parent, &references)
                .and_then(|table| {
                    let bytes = match out_dir {
                        Some(dir) => write_table(dir, &table, self.options.format)?,
                        None => 0,
                    };
                    Ok((table, bytes))
                });

            match generated {
                Ok((table, bytes)) => {
                    report.rows_generated = table.len() as u64;
                    report.bytes_written = bytes;
                    report.status = TableStatus::Generated;
                    report.duration_ms = table_start.elapsed().as_millis() as u64;
                    info!(
                        run_id = %self.run_id,
                        domain,
                        table = %spec.name,
                        rows_generated = report.rows_generated,
                        bytes_written = bytes,
                        duration_ms = report.duration_ms,
                        "table generated"
                    );
                    tables.push(table);
                    reports.push(report);
                }
                Err(err) => {
                    halted |= self.options.fail_fast;
                    reports.push(failed(report, &err, &self.run_id, table_start));
                }
            }
        }

        DomainOutcome {
            domain: domain.to_string(),
            tables,
            reports,
        }
    }

    fn effective_spec<'s>(&self, spec: &'s TableSpec) -> Cow<'s, TableSpec> {
        match self.options.count_override(&self.domain.name, &spec.name) {
            Some(count) => {
                let mut spec = spec.clone();
                spec.count = RecordCount::Fixed(count);
                Cow::Owned(spec)
            }
            None => Cow::Borrowed(spec),
        }
    }
}

enum Missing {
    /// Declared earlier but failed or skipped.
    Failed(String),
    Undeclared(String),
}

fn failed(
    mut report: TableReport,
    err: &GenerationError,
    run_id: &str,
    started: Instant,
) -> TableReport {
    report.status = TableStatus::Failed;
    report.error = Some(err.to_string());
    report.error_code = Some(err.code().to_string());
    report.duration_ms = started.elapsed().as_millis() as u64;
    warn!(
        run_id = %run_id,
        domain = %report.domain,
        table = %report.table,
        code = err.code(),
        error = %err,
        "table failed"
    );
    report
}

/// Run directory under `out_dir`: `<timestamp>__run_<run_id>`.
pub fn run_dir(out_dir: &Path, started_at: DateTime<Utc>, run_id: &str) -> PathBuf {
    let timestamp = started_at.format("%Y-%m-%dT%H-%M-%SZ");
    out_dir.join(format!("{timestamp}__run_{run_id}"))
}

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub run_dir: PathBuf,
    pub report: GenerationReport,
}

/// Entry point for generating domains into a run directory.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Generate a domain in memory without touching the filesystem.
    pub fn generate(&self, domain: &Domain) -> DomainOutcome {
        DomainRun::new(domain, &self.options).execute(None)
    }

    /// Generate every domain into `<out_dir>/<timestamp>__run_<uuid>/<domain>/`
    /// and write `generation_report.json` next to them.
    ///
    /// Table failures are recorded in the report; only failures to create
    /// the run directory or write the report are returned as errors.
    pub fn run(&self, domains: &[Domain]) -> Result<GenerationResult> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let run_dir = run_dir(&self.options.out_dir, Utc::now(), &run_id);
        std::fs::create_dir_all(&run_dir)?;
        self.run_in(&run_dir, &run_id, domains)
    }

    /// Like [`GenerationEngine::run`], into an existing directory.
    pub fn run_in(
        &self,
        run_dir: &Path,
        run_id: &str,
        domains: &[Domain],
    ) -> Result<GenerationResult> {
        let start = Instant::now();
        let mut report = GenerationReport::new(run_id.to_string(), self.options.seed);

        info!(
            run_id = %run_id,
            domains = domains.len(),
            tables = domains.iter().map(|domain| domain.tables.len()).sum::<usize>(),
            seed = self.options.seed,
            format = %self.options.format,
            "generation started"
        );

        let mut halted = false;
        for domain in domains {
            let outcome = DomainRun::new(domain, &self.options)
                .with_run_id(run_id)
                .halted(halted)
                .execute(Some(&run_dir.join(&domain.name)));
            halted |= self.options.fail_fast && !outcome.is_success();
            report.tables.extend(outcome.reports);
        }

        report.bytes_written = report.tables.iter().map(|table| table.bytes_written).sum();
        report.duration_ms = start.elapsed().as_millis() as u64;

        let report_path = run_dir.join("generation_report.json");
        std::fs::write(&report_path, serde_json::to_vec_pretty(&report)?)?;

        if report.is_success() {
            info!(
                run_id = %run_id,
                tables = report.tables.len(),
                duration_ms = report.duration_ms,
                bytes_written = report.bytes_written,
                "generation completed"
            );
        } else {
            warn!(
                run_id = %run_id,
                tables = report.tables.len(),
                failed = report.failed_count(),
                duration_ms = report.duration_ms,
                "generation completed with failures"
            );
        }

        Ok(GenerationResult {
            run_dir: run_dir.to_path_buf(),
            report,
        })
    }
}

/// Stable derivation of a sub-seed from a seed and a key.
pub fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditional::Policy;
    use crate::graph::LinkPolicy;
    use crate::ids::IdPattern;
    use crate::plan::{FieldPlan, FieldRef};

    #[test]
    fn run_dir_embeds_timestamp_and_run_id() {
        use chrono::TimeZone;

        let started_at = Utc
            .with_ymd_and_hms(2025, 3, 4, 5, 6, 7)
            .single()
            .expect("valid timestamp");
        let dir = run_dir(Path::new("out"), started_at, "abc");
        assert_eq!(dir, Path::new("out").join("2025-03-04T05-06-07Z__run_abc"));
    }

    #[test]
    fn hash_seed_depends_on_key() {
        assert_eq!(hash_seed(7, "cities"), hash_seed(7, "cities"));
        assert_ne!(hash_seed(7, "cities"), hash_seed(7, "venues"));
        assert_ne!(hash_seed(7, "cities"), hash_seed(8, "cities"));
    }

    #[test]
    fn child_without_parent_is_rejected() {
        let spec = TableSpec::new(
            "locations",
            3,
            FieldPlan::new().copy("city_id", FieldRef::parent("city_id")),
        )
        .child_of("cities", LinkPolicy::Cycle);

        let mut context = GenerationContext::new(1, 100);
        let err = context.generate_table(&spec, None).expect_err("no parent");
        assert!(matches!(err, GenerationError::InvalidPlan(_)));
    }

    #[test]
    fn per_parent_tables_follow_parent_length() {
        let cities = TableSpec::new(
            "cities",
            4,
            FieldPlan::new().id("city_id", IdPattern::parse("{upper:3}").expect("pattern")),
        );
        let market = TableSpec::new(
            "market_data",
            0,
            FieldPlan::new()
                .copy("city_id", FieldRef::parent("city_id"))
                .draw("growth", Policy::real(0.01, 0.05, 3)),
        )
        .per_parent("cities");

        let mut context = GenerationContext::new(3, 100);
        let parent = context.generate_table(&cities, None).expect("cities");
        let child = context
            .generate_table(&market, Some(&parent))
            .expect("market");
        assert_eq!(child.len(), 4);
        assert_eq!(child.key_set("city_id"), parent.key_set("city_id"));
    }

    #[test]
    fn count_overrides_prefer_qualified_keys() {
        let mut options = GenerateOptions::default();
        options.counts.insert("cities".to_string(), 5);
        options.counts.insert("restaurant.cities".to_string(), 7);
        assert_eq!(options.count_override("restaurant", "cities"), Some(7));
        assert_eq!(options.count_override("other", "cities"), Some(5));
        assert_eq!(options.count_override("other", "venues"), None);
    }
}
