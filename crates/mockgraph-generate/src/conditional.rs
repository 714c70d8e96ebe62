//! Outcome-conditioned sampling.
//!
//! A [`PolicyTable`] maps each legal driver value (typically an outcome
//! label) to the [`Policy`] used for one dependent field. Lookups for an
//! undeclared driver value fail; there is no default bucket.

use std::collections::BTreeMap;

use mockgraph_core::{GenerationError, Result, Value};

use crate::sampler::Sampler;

/// Bounds for a numeric draw.
#[derive(Debug, Clone, PartialEq)]
pub enum RangePolicy {
    Integer { min: i64, max: i64 },
    Real { min: f64, max: f64, precision: u32 },
}

impl RangePolicy {
    pub fn integer(min: i64, max: i64) -> Self {
        RangePolicy::Integer { min, max }
    }

    pub fn real(min: f64, max: f64, precision: u32) -> Self {
        RangePolicy::Real {
            min,
            max,
            precision,
        }
    }

    pub fn sample(&self, sampler: &mut Sampler) -> Result<Value> {
        match *self {
            RangePolicy::Integer { min, max } => sampler.integer(min, max).map(Value::Int),
            RangePolicy::Real {
                min,
                max,
                precision,
            } => sampler.real(min, max, precision).map(Value::Float),
        }
    }

    /// Whether `value` lies within the declared bounds.
    pub fn contains(&self, value: &Value) -> bool {
        match (self, value) {
            (RangePolicy::Integer { min, max }, Value::Int(value)) => (min..=max).contains(&value),
            (RangePolicy::Real { min, max, .. }, value) => value
                .as_f64()
                .is_some_and(|value| value >= *min && value <= *max),
            _ => false,
        }
    }
}

/// How a single field value is produced once its policy is known.
#[derive(Debug, Clone, PartialEq)]
pub enum Policy {
    Range(RangePolicy),
    Fixed(Value),
    /// Uniform pick from a pool.
    OneOf(Vec<Value>),
    /// Between `min` and `max` distinct pool members, as a list.
    Subset {
        pool: Vec<Value>,
        min: usize,
        max: usize,
    },
}

impl Policy {
    pub fn int(min: i64, max: i64) -> Self {
        Policy::Range(RangePolicy::integer(min, max))
    }

    pub fn real(min: f64, max: f64, precision: u32) -> Self {
        Policy::Range(RangePolicy::real(min, max, precision))
    }

    pub fn fixed(value: impl Into<Value>) -> Self {
        Policy::Fixed(value.into())
    }

    pub fn one_of<I, V>(pool: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Policy::OneOf(pool.into_iter().map(Into::into).collect())
    }

    pub fn subset<I, V>(pool: I, min: usize, max: usize) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Policy::Subset {
            pool: pool.into_iter().map(Into::into).collect(),
            min,
            max,
        }
    }

    /// Exactly `count` distinct pool members.
    pub fn exactly<I, V>(pool: I, count: usize) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::subset(pool, count, count)
    }

    pub fn sample(&self, sampler: &mut Sampler) -> Result<Value> {
        match self {
            Policy::Range(range) => range.sample(sampler),
            Policy::Fixed(value) => Ok(value.clone()),
            Policy::OneOf(pool) => sampler.one(pool).cloned(),
            Policy::Subset { pool, min, max } => {
                let picked = sampler.many_between(pool, *min, *max)?;
                Ok(Value::List(picked.into_iter().cloned().collect()))
            }
        }
    }
}

impl From<RangePolicy> for Policy {
    fn from(range: RangePolicy) -> Self {
        Policy::Range(range)
    }
}

/// Driver value -> policy for one dependent field.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyTable {
    field: String,
    entries: BTreeMap<String, Policy>,
}

impl PolicyTable {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn with(mut self, driver: impl Into<String>, policy: Policy) -> Self {
        self.entries.insert(driver.into(), policy);
        self
    }

    /// Assign the same policy to several driver values.
    pub fn with_all(mut self, drivers: &[&str], policy: Policy) -> Self {
        for driver in drivers {
            self.entries.insert((*driver).to_string(), policy.clone());
        }
        self
    }

    /// Boolean flag derived from set membership: drivers in `members` map
    /// to `true`, the rest of `domain` to `false`.
    pub fn membership(field: impl Into<String>, domain: &[&str], members: &[&str]) -> Result<Self> {
        let field = field.into();
        if let Some(stray) = members.iter().find(|member| !domain.contains(member)) {
            return Err(GenerationError::InvalidPlan(format!(
                "flag '{field}' member '{stray}' is not a declared driver value"
            )));
        }
        let entries = domain
            .iter()
            .map(|driver| {
                let value = members.contains(driver);
                ((*driver).to_string(), Policy::Fixed(Value::Bool(value)))
            })
            .collect();
        Ok(Self { field, entries })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn drivers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn lookup(&self, driver: &str) -> Result<&Policy> {
        self.entries
            .get(driver)
            .ok_or_else(|| GenerationError::UnknownDriverValue {
                field: self.field.clone(),
                value: driver.to_string(),
            })
    }
}

/// Resolve the dependent field for `driver`.
pub fn resolve(sampler: &mut Sampler, driver: &str, table: &PolicyTable) -> Result<Value> {
    table.lookup(driver)?.sample(sampler)
}

/// Rounding applied to a derived numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Nearest integer, halves away from zero.
    Integer,
    /// Largest integer not above the value.
    Floor,
    /// Fixed number of fractional digits.
    Decimals(u32),
}

impl Rounding {
    pub fn apply(self, value: f64) -> Result<Value> {
        if !value.is_finite() {
            return Err(GenerationError::InvalidRange(format!(
                "cannot round non-finite value {value}"
            )));
        }
        match self {
            Rounding::Integer => Ok(Value::Int(value.round() as i64)),
            Rounding::Floor => Ok(Value::Int(value.floor() as i64)),
            Rounding::Decimals(digits) => {
                let scale = 10_f64.powi(digits as i32);
                Ok(Value::Float((value * scale).round() / scale))
            }
        }
    }
}

/// `base * factor`, rounded.
pub fn scale(base: &Value, factor: &Value, rounding: Rounding) -> Result<Value> {
    let base = numeric(base, "base")?;
    let factor = numeric(factor, "factor")?;
    rounding.apply(base * factor)
}

/// Sum of numeric values; integer when every term is an integer.
pub fn sum(terms: &[Value]) -> Result<Value> {
    if terms.iter().all(|term| matches!(term, Value::Int(_))) {
        let total = terms
            .iter()
            .filter_map(Value::as_i64)
            .try_fold(0_i64, |acc, term| acc.checked_add(term))
            .ok_or_else(|| GenerationError::InvalidRange("integer sum overflows".to_string()))?;
        return Ok(Value::Int(total));
    }
    let mut total = 0.0;
    for term in terms {
        total += numeric(term, "term")?;
    }
    Ok(Value::Float(total))
}

fn numeric(value: &Value, role: &str) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        GenerationError::InvalidPlan(format!("{role} is not numeric: {value:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTCOMES: &[&str] = &[
        "highly_successful",
        "successful",
        "satisfactory",
        "problematic",
        "terminated_early",
    ];

    fn defect_rate() -> PolicyTable {
        PolicyTable::new("avg_defect_rate")
            .with_all(
                &["highly_successful", "successful", "satisfactory"],
                Policy::real(0.010, 0.035, 3),
            )
            .with_all(&["problematic", "terminated_early"], Policy::real(0.040, 0.080, 3))
    }

    #[test]
    fn resolved_values_use_the_driver_bounds() {
        let mut sampler = Sampler::seeded(17);
        let table = defect_rate();
        let good = RangePolicy::real(0.010, 0.035, 3);
        let bad = RangePolicy::real(0.040, 0.080, 3);

        for _ in 0..200 {
            let value = resolve(&mut sampler, "successful", &table).expect("resolve");
            assert!(good.contains(&value) && !bad.contains(&value));
            let value = resolve(&mut sampler, "problematic", &table).expect("resolve");
            assert!(bad.contains(&value) && !good.contains(&value));
        }
    }

    #[test]
    fn missing_driver_entry_is_an_error() {
        let mut sampler = Sampler::seeded(17);
        let table = PolicyTable::new("defect_rate").with("problematic", Policy::real(0.04, 0.08, 3));

        let err = resolve(&mut sampler, "successful", &table).expect_err("no entry");
        match err {
            GenerationError::UnknownDriverValue { field, value } => {
                assert_eq!(field, "defect_rate");
                assert_eq!(value, "successful");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn membership_flag_is_data_driven() {
        let mut sampler = Sampler::seeded(1);
        let flag = PolicyTable::membership(
            "would_recommend",
            OUTCOMES,
            &["highly_successful", "successful", "satisfactory"],
        )
        .expect("flag");

        assert_eq!(
            resolve(&mut sampler, "satisfactory", &flag).expect("resolve"),
            Value::Bool(true)
        );
        assert_eq!(
            resolve(&mut sampler, "terminated_early", &flag).expect("resolve"),
            Value::Bool(false)
        );
        assert!(matches!(
            resolve(&mut sampler, "unheard_of", &flag),
            Err(GenerationError::UnknownDriverValue { .. })
        ));
    }

    #[test]
    fn membership_rejects_undeclared_members() {
        let result = PolicyTable::membership("flag", &["a", "b"], &["c"]);
        assert!(matches!(result, Err(GenerationError::InvalidPlan(_))));
    }

    #[test]
    fn subset_policy_draws_distinct_members() {
        let mut sampler = Sampler::seeded(4);
        let policy = Policy::subset(["a", "b", "c", "d"], 2, 3);

        for _ in 0..50 {
            let value = policy.sample(&mut sampler).expect("sample");
            let items = value.as_list().expect("list");
            assert!((2..=3).contains(&items.len()));
            let mut keys: Vec<String> = items.iter().filter_map(Value::as_key).collect();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), items.len());
        }
    }

    #[test]
    fn scaled_values_round_per_declared_precision() {
        assert_eq!(
            scale(&Value::Int(400_000), &Value::Float(1.3), Rounding::Integer).expect("scale"),
            Value::Int(520_000)
        );
        assert_eq!(
            scale(&Value::Int(999), &Value::Float(0.1), Rounding::Floor).expect("scale"),
            Value::Int(99)
        );
        assert_eq!(
            scale(&Value::Float(0.3333), &Value::Int(1), Rounding::Decimals(2)).expect("scale"),
            Value::Float(0.33)
        );
        assert!(matches!(
            scale(&Value::from("x"), &Value::Int(1), Rounding::Integer),
            Err(GenerationError::InvalidPlan(_))
        ));
    }

    #[test]
    fn sum_keeps_integers_integral() {
        assert_eq!(
            sum(&[Value::Int(1), Value::Int(2), Value::Int(3)]).expect("sum"),
            Value::Int(6)
        );
        assert_eq!(
            sum(&[Value::Int(1), Value::Float(0.5)]).expect("sum"),
            Value::Float(1.5)
        );
    }
}
