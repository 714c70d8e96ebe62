use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use mockgraph_generate::{
    Domain, FieldPlan, FieldRef, GenerateOptions, GenerationEngine, IdPattern, LinkPolicy,
    OutputFormat, Policy, PolicyTable, TableSpec, TableStatus,
};

fn hash_file(path: &Path) -> Result<String, std::io::Error> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0_u8; 8192];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn temp_out() -> PathBuf {
    std::env::temp_dir().join(format!("mockgraph_engine_{}", uuid::Uuid::new_v4()))
}

fn fixture_domain() -> Domain {
    let cities = TableSpec::new(
        "cities",
        12,
        FieldPlan::new()
            .id("city_id", IdPattern::parse("{upper:3}").expect("pattern"))
            .draw("population", Policy::int(50_000, 2_000_000)),
    );
    let expansions = TableSpec::new(
        "expansions",
        40,
        FieldPlan::new()
            .draw("year", Policy::int(2015, 2023))
            .hidden()
            .id(
                "expansion_id",
                IdPattern::parse("EXP-{field:year}-{upper:3}").expect("pattern"),
            )
            .copy("city_id", FieldRef::parent("city_id"))
            .draw("outcome", Policy::one_of(["successful", "failed"])),
    )
    .child_of("cities", LinkPolicy::random_within(5));
    let locations = TableSpec::new(
        "locations",
        30,
        FieldPlan::new()
            .copy("city_id", FieldRef::parent("city_id"))
            .id_partitioned(
                "location_id",
                IdPattern::parse("LOC-{field:city_id}-{seq:3}").expect("pattern"),
                FieldRef::own("city_id"),
            ),
    )
    .child_of("cities", LinkPolicy::Cycle);

    Domain::new("fixture", "test fixture")
        .with_table(cities)
        .with_table(expansions)
        .with_table(locations)
}

fn broken_domain() -> Domain {
    let clients = TableSpec::new(
        "clients",
        5,
        FieldPlan::new().id("client_id", IdPattern::parse("CLI-{seq:4}").expect("pattern")),
    );
    let events = TableSpec::new(
        "events",
        5,
        FieldPlan::new()
            .draw("outcome", Policy::one_of(["successful"]))
            .conditional(
                "rating",
                FieldRef::own("outcome"),
                PolicyTable::new("rating").with("problematic", Policy::real(2.0, 3.0, 1)),
            ),
    );
    let reviews = TableSpec::new(
        "reviews",
        5,
        FieldPlan::new().copy("outcome", FieldRef::parent("outcome")),
    )
    .child_of("events", LinkPolicy::Cycle);
    let requests = TableSpec::new(
        "requests",
        5,
        FieldPlan::new().copy("client_id", FieldRef::parent("client_id")),
    )
    .child_of("clients", LinkPolicy::random());

    Domain::new("broken", "one table with a policy gap")
        .with_table(clients)
        .with_table(events)
        .with_table(reviews)
        .with_table(requests)
}

#[test]
fn same_seed_produces_identical_files() {
    let out = temp_out();
    let options = GenerateOptions {
        out_dir: out.clone(),
        seed: 4242,
        ..GenerateOptions::default()
    };
    let engine = GenerationEngine::new(options);
    let domains = vec![fixture_domain()];

    let first = engine.run(&domains).expect("first run");
    let second = engine.run(&domains).expect("second run");
    assert!(first.report.is_success());
    assert_ne!(first.run_dir, second.run_dir);

    for table in ["cities", "expansions", "locations"] {
        let file = format!("{table}.json");
        let a = hash_file(&first.run_dir.join("fixture").join(&file)).expect("hash");
        let b = hash_file(&second.run_dir.join("fixture").join(&file)).expect("hash");
        assert_eq!(a, b, "{table} differs between runs");
    }
    assert!(first.run_dir.join("generation_report.json").exists());

    let _ = std::fs::remove_dir_all(out);
}

#[test]
fn partitioned_sequences_restart_per_parent() {
    let engine = GenerationEngine::new(GenerateOptions::default());
    let outcome = engine.generate(&fixture_domain());
    assert!(outcome.is_success());

    let locations = outcome.table("locations").expect("locations");
    let cities = outcome.table("cities").expect("cities");
    let first_city = cities.records()[0]
        .get("city_id")
        .and_then(|value| value.as_str())
        .expect("city");
    let first = locations.records()[0]
        .get("location_id")
        .and_then(|value| value.as_str())
        .expect("location");
    assert_eq!(first, format!("LOC-{first_city}-001"));
    assert_eq!(locations.key_set("location_id").len(), 30);
}

#[test]
fn failed_table_does_not_stop_independent_tables() {
    let out = temp_out();
    let options = GenerateOptions {
        out_dir: out.clone(),
        format: OutputFormat::Jsonl,
        ..GenerateOptions::default()
    };
    let result = GenerationEngine::new(options)
        .run(&[broken_domain()])
        .expect("run");
    let report = &result.report;
    let dir = result.run_dir.join("broken");

    let events = report.table("broken", "events").expect("events report");
    assert_eq!(events.status, TableStatus::Failed);
    assert_eq!(events.error_code.as_deref(), Some("unknown_driver_value"));
    assert!(!dir.join("events.jsonl").exists());
    assert!(!dir.join("events.jsonl.tmp").exists());

    let reviews = report.table("broken", "reviews").expect("reviews report");
    assert_eq!(reviews.status, TableStatus::Skipped);

    let requests = report.table("broken", "requests").expect("requests report");
    assert_eq!(requests.status, TableStatus::Generated);
    assert!(dir.join("requests.jsonl").exists());
    assert!(!report.is_success());
    assert_eq!(report.failed_count(), 2);

    let _ = std::fs::remove_dir_all(out);
}

#[test]
fn fail_fast_skips_everything_after_the_first_failure() {
    let options = GenerateOptions {
        fail_fast: true,
        ..GenerateOptions::default()
    };
    let outcome = GenerationEngine::new(options).generate(&broken_domain());

    let statuses: Vec<TableStatus> = outcome.reports.iter().map(|report| report.status).collect();
    assert_eq!(
        statuses,
        vec![
            TableStatus::Generated,
            TableStatus::Failed,
            TableStatus::Skipped,
            TableStatus::Skipped
        ]
    );
}

#[test]
fn count_overrides_apply_per_table() {
    let mut options = GenerateOptions::default();
    options.counts.insert("fixture.cities".to_string(), 3);
    options.counts.insert("locations".to_string(), 7);
    let outcome = GenerationEngine::new(options).generate(&fixture_domain());

    assert_eq!(outcome.table("cities").map(|table| table.len()), Some(3));
    assert_eq!(outcome.table("locations").map(|table| table.len()), Some(7));
    assert_eq!(outcome.table("expansions").map(|table| table.len()), Some(40));
}
