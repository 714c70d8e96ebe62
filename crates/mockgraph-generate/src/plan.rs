//! Field plans: the ordered steps that build one record.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use mockgraph_core::{GenerationError, Record, Result, Value};

use crate::conditional::{self, Policy, PolicyTable, Rounding};
use crate::graph::LinkPolicy;
use crate::ids::IdPattern;
use crate::sampler::Sampler;

/// A field of the record under construction or of its linked parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    Own(String),
    Parent(String),
}

impl FieldRef {
    pub fn own(name: impl Into<String>) -> Self {
        FieldRef::Own(name.into())
    }

    pub fn parent(name: impl Into<String>) -> Self {
        FieldRef::Parent(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            FieldRef::Own(name) | FieldRef::Parent(name) => name,
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Own(name) => write!(f, "{name}"),
            FieldRef::Parent(name) => write!(f, "parent.{name}"),
        }
    }
}

/// Where a step's value comes from.
#[derive(Debug, Clone)]
pub enum Source {
    Draw(Policy),
    /// Policy chosen by the value of `driver`.
    Conditional { driver: FieldRef, table: PolicyTable },
    Field(FieldRef),
}

impl Source {
    pub fn own(name: impl Into<String>) -> Self {
        Source::Field(FieldRef::own(name))
    }

    pub fn parent(name: impl Into<String>) -> Self {
        Source::Field(FieldRef::parent(name))
    }

    pub fn resolve(&self, draft: &RecordDraft<'_>, sampler: &mut Sampler) -> Result<Value> {
        match self {
            Source::Draw(policy) => policy.sample(sampler),
            Source::Conditional { driver, table } => {
                let value = draft.lookup(driver)?;
                let key = value.as_key().ok_or_else(|| {
                    GenerationError::InvalidPlan(format!(
                        "driver '{driver}' holds a non-categorical value {value:?}"
                    ))
                })?;
                conditional::resolve(sampler, &key, table)
            }
            Source::Field(field) => draft.lookup(field).cloned(),
        }
    }

    fn refs(&self) -> Vec<&FieldRef> {
        match self {
            Source::Draw(_) => Vec::new(),
            Source::Conditional { driver, .. } => vec![driver],
            Source::Field(field) => vec![field],
        }
    }
}

impl From<Policy> for Source {
    fn from(policy: Policy) -> Self {
        Source::Draw(policy)
    }
}

pub type DeriveFn = Arc<dyn Fn(&RecordDraft<'_>, &mut Sampler) -> Result<Value> + Send + Sync>;

#[derive(Clone)]
pub enum FieldRule {
    /// Unique identifier in the table's namespace, optionally partitioned by
    /// the value of another field.
    Identifier {
        pattern: IdPattern,
        partition: Option<FieldRef>,
    },
    Value(Source),
    /// `base * factor`, rounded.
    Scaled {
        base: Source,
        factor: Source,
        rounding: Rounding,
    },
    Sum(Vec<Source>),
    /// Uniform pick of a whole record from another generated table, stored
    /// as an object. Later steps read its members as `name.field`.
    Reference { table: String },
    Derived(DeriveFn),
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRule::Identifier { pattern, partition } => f
                .debug_struct("Identifier")
                .field("pattern", &pattern.to_string())
                .field("partition", partition)
                .finish(),
            FieldRule::Value(source) => f.debug_tuple("Value").field(source).finish(),
            FieldRule::Scaled {
                base,
                factor,
                rounding,
            } => f
                .debug_struct("Scaled")
                .field("base", base)
                .field("factor", factor)
                .field("rounding", rounding)
                .finish(),
            FieldRule::Sum(terms) => f.debug_tuple("Sum").field(terms).finish(),
            FieldRule::Reference { table } => {
                f.debug_struct("Reference").field("table", table).finish()
            }
            FieldRule::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldStep {
    pub name: String,
    pub rule: FieldRule,
    /// Readable by later steps, left out of the emitted record.
    pub hidden: bool,
}

/// Ordered field-generation steps. Later steps may read earlier ones.
#[derive(Debug, Clone, Default)]
pub struct FieldPlan {
    steps: Vec<FieldStep>,
}

impl FieldPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[FieldStep] {
        &self.steps
    }

    pub fn step(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.steps.push(FieldStep {
            name: name.into(),
            rule,
            hidden: false,
        });
        self
    }

    pub fn id(self, name: impl Into<String>, pattern: IdPattern) -> Self {
        self.step(
            name,
            FieldRule::Identifier {
                pattern,
                partition: None,
            },
        )
    }

    pub fn id_partitioned(
        self,
        name: impl Into<String>,
        pattern: IdPattern,
        partition: FieldRef,
    ) -> Self {
        self.step(
            name,
            FieldRule::Identifier {
                pattern,
                partition: Some(partition),
            },
        )
    }

    pub fn draw(self, name: impl Into<String>, policy: Policy) -> Self {
        self.step(name, FieldRule::Value(Source::Draw(policy)))
    }

    pub fn conditional(self, name: impl Into<String>, driver: FieldRef, table: PolicyTable) -> Self {
        self.step(name, FieldRule::Value(Source::Conditional { driver, table }))
    }

    pub fn copy(self, name: impl Into<String>, from: FieldRef) -> Self {
        self.step(name, FieldRule::Value(Source::Field(from)))
    }

    pub fn scaled(
        self,
        name: impl Into<String>,
        base: impl Into<Source>,
        factor: impl Into<Source>,
        rounding: Rounding,
    ) -> Self {
        self.step(
            name,
            FieldRule::Scaled {
                base: base.into(),
                factor: factor.into(),
                rounding,
            },
        )
    }

    pub fn sum(self, name: impl Into<String>, terms: Vec<Source>) -> Self {
        self.step(name, FieldRule::Sum(terms))
    }

    pub fn reference(self, name: impl Into<String>, table: impl Into<String>) -> Self {
        self.step(
            name,
            FieldRule::Reference {
                table: table.into(),
            },
        )
    }

    pub fn derive<F>(self, name: impl Into<String>, derive: F) -> Self
    where
        F: Fn(&RecordDraft<'_>, &mut Sampler) -> Result<Value> + Send + Sync + 'static,
    {
        self.step(name, FieldRule::Derived(Arc::new(derive)))
    }

    /// Mark the most recently added step as hidden.
    pub fn hidden(mut self) -> Self {
        if let Some(step) = self.steps.last_mut() {
            step.hidden = true;
        }
        self
    }

    /// Emitted field names, in evaluation order.
    pub fn output_fields(&self) -> impl Iterator<Item = &str> {
        self.steps
            .iter()
            .filter(|step| !step.hidden)
            .map(|step| step.name.as_str())
    }

    /// Tables read by `reference` steps.
    pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|step| match &step.rule {
            FieldRule::Reference { table } => Some(table.as_str()),
            _ => None,
        })
    }

    /// Check that every reference points at an earlier field and that parent
    /// reads only occur when a parent is linked.
    pub fn validate(&self, has_parent: bool) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::new();
        for step in &self.steps {
            let check = |field: &FieldRef| -> Result<()> {
                match field {
                    FieldRef::Own(name) if !seen.contains(field_head(name)) => {
                        Err(GenerationError::InvalidPlan(format!(
                            "field '{}' reads '{name}' before it is produced",
                            step.name
                        )))
                    }
                    FieldRef::Parent(name) if !has_parent => {
                        Err(GenerationError::InvalidPlan(format!(
                            "field '{}' reads parent field '{name}' without a parent link",
                            step.name
                        )))
                    }
                    _ => Ok(()),
                }
            };

            match &step.rule {
                FieldRule::Identifier { pattern, partition } => {
                    for name in pattern.field_refs() {
                        check(&FieldRef::own(name))?;
                    }
                    if let Some(partition) = partition {
                        check(partition)?;
                    }
                }
                FieldRule::Value(source) => {
                    for field in source.refs() {
                        check(field)?;
                    }
                }
                FieldRule::Scaled { base, factor, .. } => {
                    for field in base.refs().into_iter().chain(factor.refs()) {
                        check(field)?;
                    }
                }
                FieldRule::Sum(terms) => {
                    for field in terms.iter().flat_map(Source::refs) {
                        check(field)?;
                    }
                }
                FieldRule::Reference { .. } | FieldRule::Derived(_) => {}
            }

            if !seen.insert(step.name.as_str()) {
                return Err(GenerationError::InvalidPlan(format!(
                    "field '{}' is declared twice",
                    step.name
                )));
            }
        }
        Ok(())
    }
}

fn field_head(name: &str) -> &str {
    name.split_once('.').map_or(name, |(head, _)| head)
}

/// The record under construction, plus its linked parent.
#[derive(Debug)]
pub struct RecordDraft<'a> {
    fields: Vec<(String, Value, bool)>,
    parent: Option<&'a Record>,
    index: usize,
}

impl<'a> RecordDraft<'a> {
    pub fn new(index: usize, parent: Option<&'a Record>) -> Self {
        Self {
            fields: Vec::new(),
            parent,
            index,
        }
    }

    /// Position of this record within its table.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn parent(&self) -> Option<&'a Record> {
        self.parent
    }

    /// Value of an earlier field. `name.member` reads a member of an
    /// object-valued field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let exact = self
            .fields
            .iter()
            .find(|(field, _, _)| field == name)
            .map(|(_, value, _)| value);
        if exact.is_some() {
            return exact;
        }
        let (head, member) = name.split_once('.')?;
        match self.get(head)? {
            Value::Object(record) => record.get(member),
            _ => None,
        }
    }

    pub fn parent_field(&self, name: &str) -> Option<&'a Value> {
        self.parent.and_then(|parent| parent.get(name))
    }

    pub fn lookup(&self, field: &FieldRef) -> Result<&Value> {
        let value = match field {
            FieldRef::Own(name) => self.get(name),
            FieldRef::Parent(name) => self.parent_field(name),
        };
        value.ok_or_else(|| {
            GenerationError::InvalidPlan(format!("field '{field}' is not available"))
        })
    }

    /// Text of an earlier field, for derived steps.
    pub fn text(&self, name: &str) -> Result<&str> {
        self.get(name).and_then(Value::as_str).ok_or_else(|| {
            GenerationError::InvalidPlan(format!("field '{name}' is not text"))
        })
    }

    /// Integer of an earlier field, for derived steps.
    pub fn int(&self, name: &str) -> Result<i64> {
        self.get(name).and_then(Value::as_i64).ok_or_else(|| {
            GenerationError::InvalidPlan(format!("field '{name}' is not an integer"))
        })
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value, hidden: bool) {
        self.fields.push((name.into(), value, hidden));
    }

    /// The emitted record, without hidden fields.
    pub fn finish(self) -> Record {
        Record::from_fields(
            self.fields
                .into_iter()
                .filter(|(_, _, hidden)| !hidden)
                .map(|(name, value, _)| (name, value))
                .collect(),
        )
    }
}

/// How many records a table gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordCount {
    Fixed(usize),
    /// One record per parent record.
    PerParent,
}

#[derive(Debug, Clone)]
pub struct ParentBinding {
    pub table: String,
    pub policy: LinkPolicy,
}

/// Everything needed to generate one table.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub name: String,
    pub count: RecordCount,
    pub parent: Option<ParentBinding>,
    pub plan: FieldPlan,
}

impl TableSpec {
    pub fn new(name: impl Into<String>, count: usize, plan: FieldPlan) -> Self {
        Self {
            name: name.into(),
            count: RecordCount::Fixed(count),
            parent: None,
            plan,
        }
    }

    pub fn child_of(mut self, table: impl Into<String>, policy: LinkPolicy) -> Self {
        self.parent = Some(ParentBinding {
            table: table.into(),
            policy,
        });
        self
    }

    /// One record per parent, linked in parent order.
    pub fn per_parent(mut self, table: impl Into<String>) -> Self {
        self.count = RecordCount::PerParent;
        self.parent = Some(ParentBinding {
            table: table.into(),
            policy: LinkPolicy::Cycle,
        });
        self
    }

    pub fn parent_table(&self) -> Option<&str> {
        self.parent.as_ref().map(|binding| binding.table.as_str())
    }

    /// Parent and referenced tables, which must be generated first.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = self.parent_table().into_iter().collect();
        for table in self.plan.referenced_tables() {
            if !tables.contains(&table) {
                tables.push(table);
            }
        }
        tables
    }

    /// Record count for a given parent table length.
    pub fn resolve_count(&self, parent_len: Option<usize>) -> Result<usize> {
        match self.count {
            RecordCount::Fixed(count) => Ok(count),
            RecordCount::PerParent => parent_len.ok_or_else(|| {
                GenerationError::InvalidPlan(format!(
                    "table '{}' is sized per parent but has no parent",
                    self.name
                ))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_forward_references() {
        let plan = FieldPlan::new()
            .copy("a", FieldRef::own("b"))
            .draw("b", Policy::int(1, 2));
        let err = plan.validate(false).expect_err("forward ref");
        assert!(err.to_string().contains("reads 'b' before it is produced"));
    }

    #[test]
    fn validate_rejects_parent_reads_without_parent() {
        let plan = FieldPlan::new().copy("city_id", FieldRef::parent("city_id"));
        assert!(plan.validate(false).is_err());
        assert!(plan.validate(true).is_ok());
    }

    #[test]
    fn validate_rejects_duplicates_and_unbound_patterns() {
        let plan = FieldPlan::new()
            .draw("a", Policy::int(1, 2))
            .draw("a", Policy::int(1, 2));
        assert!(plan.validate(false).is_err());

        let pattern = IdPattern::parse("EXP-{field:year}-{upper:3}").expect("pattern");
        let plan = FieldPlan::new().id("id", pattern.clone());
        assert!(plan.validate(false).is_err());

        let plan = FieldPlan::new()
            .draw("year", Policy::int(2015, 2023))
            .hidden()
            .id("id", pattern);
        assert!(plan.validate(false).is_ok());
        assert_eq!(plan.output_fields().collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn members_of_referenced_records_are_readable() {
        let plan = FieldPlan::new()
            .reference("client", "client_profiles")
            .hidden()
            .copy("client_id", FieldRef::own("client.client_id"));
        assert!(plan.validate(false).is_ok());
        assert_eq!(
            plan.referenced_tables().collect::<Vec<_>>(),
            vec!["client_profiles"]
        );

        let client = Record::from_fields(vec![("client_id".to_string(), Value::from("CLI-101"))]);
        let mut draft = RecordDraft::new(0, None);
        draft.push("client", Value::Object(client), true);
        assert_eq!(
            draft.lookup(&FieldRef::own("client.client_id")).expect("member"),
            &Value::from("CLI-101")
        );
        assert!(draft.get("client.missing").is_none());
    }

    #[test]
    fn draft_finish_drops_hidden_fields() {
        let mut draft = RecordDraft::new(0, None);
        draft.push("year", Value::Int(2020), true);
        draft.push("id", Value::from("EXP-2020-ABC"), false);
        assert_eq!(draft.int("year").expect("year"), 2020);

        let record = draft.finish();
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("id").and_then(Value::as_str), Some("EXP-2020-ABC"));
    }
}
