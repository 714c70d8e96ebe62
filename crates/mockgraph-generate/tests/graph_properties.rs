use std::collections::HashSet;

use mockgraph_generate::{
    EntityGraphBuilder, FieldPlan, FieldRef, GenerationError, IdAllocator, IdPattern, LinkPolicy,
    Namespace, ParentLink, Policy, PolicyTable, RangePolicy, Sampler, Table, Value,
};

const OUTCOMES: &[&str] = &["highly_successful", "successful", "problematic"];

fn suppliers(ids: &mut IdAllocator, sampler: &mut Sampler, count: usize) -> Table {
    let plan = FieldPlan::new()
        .id("supplier_id", IdPattern::parse("SUP-{digits:4}").expect("pattern"))
        .draw("category", Policy::one_of(["steel", "resin", "glass"]));
    EntityGraphBuilder::new(ids, sampler)
        .build("suppliers", None, count, &plan)
        .expect("suppliers")
}

fn history_plan() -> FieldPlan {
    FieldPlan::new()
        .id("relationship_id", IdPattern::parse("REL-{seq:3}").expect("pattern"))
        .copy("supplier_id", FieldRef::parent("supplier_id"))
        .draw("outcome", Policy::one_of(OUTCOMES.iter().copied()))
        .conditional(
            "defect_rate",
            FieldRef::own("outcome"),
            PolicyTable::new("defect_rate")
                .with_all(&["highly_successful", "successful"], Policy::real(0.010, 0.035, 3))
                .with("problematic", Policy::real(0.040, 0.080, 3)),
        )
        .conditional(
            "incidents",
            FieldRef::own("outcome"),
            PolicyTable::new("incidents")
                .with_all(&["highly_successful", "successful"], Policy::int(0, 5))
                .with("problematic", Policy::int(6, 15)),
        )
}

#[test]
fn identifiers_are_unique_up_to_pattern_capacity() {
    let mut ids = IdAllocator::new();
    let mut sampler = Sampler::seeded(11);
    let pattern = IdPattern::parse("{digits:2}").expect("pattern");
    let namespace = Namespace::new("codes");

    let mut seen = HashSet::new();
    for _ in 0..100 {
        let id = ids.allocate(&namespace, &pattern, &mut sampler).expect("allocate");
        assert!(seen.insert(id));
    }
    let err = ids
        .allocate(&namespace, &pattern, &mut sampler)
        .expect_err("namespace is full");
    assert!(matches!(err, GenerationError::CapacityExhausted { .. }));
}

#[test]
fn child_links_reference_existing_parents() {
    let mut ids = IdAllocator::new();
    let mut sampler = Sampler::seeded(23);
    let parents = suppliers(&mut ids, &mut sampler, 40);
    let parent_ids = parents.key_set("supplier_id");

    let history = EntityGraphBuilder::new(&mut ids, &mut sampler)
        .build(
            "supplier_history",
            Some(ParentLink::new(&parents, LinkPolicy::random())),
            300,
            &history_plan(),
        )
        .expect("history");

    assert_eq!(history.len(), 300);
    for record in &history {
        let supplier = record.get("supplier_id").and_then(Value::as_key).expect("link");
        assert!(parent_ids.contains(&supplier));
    }
    assert_eq!(history.key_set("relationship_id").len(), 300);
}

#[test]
fn dependent_fields_stay_within_their_driver_bounds() {
    let mut ids = IdAllocator::new();
    let mut sampler = Sampler::seeded(29);
    let parents = suppliers(&mut ids, &mut sampler, 10);
    let history = EntityGraphBuilder::new(&mut ids, &mut sampler)
        .build(
            "supplier_history",
            Some(ParentLink::new(&parents, LinkPolicy::random())),
            500,
            &history_plan(),
        )
        .expect("history");

    for record in &history {
        let outcome = record.get("outcome").and_then(Value::as_str).expect("outcome");
        let defect = record.get("defect_rate").expect("defect_rate");
        let incidents = record.get("incidents").expect("incidents");
        let (defect_range, incident_range) = if outcome == "problematic" {
            (RangePolicy::real(0.040, 0.080, 3), RangePolicy::integer(6, 15))
        } else {
            (RangePolicy::real(0.010, 0.035, 3), RangePolicy::integer(0, 5))
        };
        assert!(defect_range.contains(defect), "{outcome}: {defect:?}");
        assert!(incident_range.contains(incidents), "{outcome}: {incidents:?}");
    }
}

#[test]
fn cycle_links_ignore_randomness_elsewhere_in_the_record() {
    let mut ids = IdAllocator::new();
    let mut sampler = Sampler::seeded(31);
    let parents = suppliers(&mut ids, &mut sampler, 6);

    for seed in [1_u64, 2, 3] {
        let mut ids = IdAllocator::new();
        let mut sampler = Sampler::seeded(seed);
        let history = EntityGraphBuilder::new(&mut ids, &mut sampler)
            .build(
                "supplier_history",
                Some(ParentLink::new(&parents, LinkPolicy::Cycle)),
                20,
                &history_plan(),
            )
            .expect("history");

        for (index, record) in history.iter().enumerate() {
            let expected = parents
                .get(index % parents.len())
                .and_then(|parent| parent.get("supplier_id"));
            assert_eq!(record.get("supplier_id"), expected);
        }
    }
}

#[test]
fn identical_seeds_build_identical_tables() {
    let build = |seed: u64| {
        let mut ids = IdAllocator::new();
        let mut sampler = Sampler::seeded(seed);
        let parents = suppliers(&mut ids, &mut sampler, 5);
        let history = EntityGraphBuilder::new(&mut ids, &mut sampler)
            .build(
                "supplier_history",
                Some(ParentLink::new(&parents, LinkPolicy::random())),
                50,
                &history_plan(),
            )
            .expect("history");
        serde_json::to_string(&history).expect("json")
    };

    assert_eq!(build(77), build(77));
    assert_ne!(build(77), build(78));
}
