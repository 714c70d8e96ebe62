use mockgraph_core::{Record, Table, Value};

fn city(id: &str, population: i64, growth: f64) -> Record {
    Record::from_fields(vec![
        ("city_id".to_string(), Value::from(id)),
        ("population".to_string(), Value::Int(population)),
        ("growth_rate".to_string(), Value::Float(growth)),
        (
            "major_industries".to_string(),
            Value::List(vec![Value::from("energy"), Value::from("retail")]),
        ),
    ])
}

#[test]
fn record_serializes_fields_in_generation_order() {
    let record = city("ABC", 250_000, 0.031);
    let json = serde_json::to_string(&record).expect("serialize record");

    assert_eq!(
        json,
        r#"{"city_id":"ABC","population":250000,"growth_rate":0.031,"major_industries":["energy","retail"]}"#
    );
}

#[test]
fn table_serializes_as_array_of_records() {
    let table = Table::new("cities", vec![city("ABC", 1, 0.5), city("XYZ", 2, -0.01)]);
    let value: serde_json::Value = serde_json::to_value(&table).expect("serialize table");

    let array = value.as_array().expect("array document");
    assert_eq!(array.len(), 2);
    assert_eq!(array[1]["city_id"], "XYZ");
    assert_eq!(array[1]["growth_rate"], -0.01);
}

#[test]
fn nested_objects_and_nulls_serialize() {
    let requirements = Record::from_fields(vec![
        ("region".to_string(), Value::List(vec![Value::from("Midwest")])),
        ("max_airport_distance_miles".to_string(), Value::Int(12)),
    ]);
    let record = Record::from_fields(vec![
        ("end_date".to_string(), Value::Null),
        ("location_requirements".to_string(), Value::Object(requirements)),
    ]);

    let json = serde_json::to_string(&record).expect("serialize record");
    assert_eq!(
        json,
        r#"{"end_date":null,"location_requirements":{"region":["Midwest"],"max_airport_distance_miles":12}}"#
    );
}

#[test]
fn key_set_collects_scalar_keys() {
    let table = Table::new("cities", vec![city("ABC", 1, 0.5), city("XYZ", 2, 0.1)]);
    let keys = table.key_set("city_id");

    assert_eq!(keys.len(), 2);
    assert!(keys.contains("ABC"));
    assert!(table.key_set("growth_rate").is_empty());
}
