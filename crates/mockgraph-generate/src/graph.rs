//! Parent/child table assembly.

use mockgraph_core::{GenerationError, Record, Result, Table, Value};

use crate::conditional;
use crate::ids::{IdAllocator, Namespace};
use crate::plan::{FieldPlan, FieldRule, FieldStep, RecordDraft};
use crate::sampler::Sampler;

/// How each child record picks its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPolicy {
    /// Uniform pick with replacement, optionally limited to the first
    /// `prefix` parents.
    Random { prefix: Option<usize> },
    /// Child `i` links to parent `i mod len`.
    Cycle,
}

impl LinkPolicy {
    pub fn random() -> Self {
        LinkPolicy::Random { prefix: None }
    }

    pub fn random_within(prefix: usize) -> Self {
        LinkPolicy::Random {
            prefix: Some(prefix),
        }
    }
}

/// An already generated parent table and the policy used to link to it.
#[derive(Debug, Clone, Copy)]
pub struct ParentLink<'a> {
    pub table: &'a Table,
    pub policy: LinkPolicy,
}

impl<'a> ParentLink<'a> {
    pub fn new(table: &'a Table, policy: LinkPolicy) -> Self {
        Self { table, policy }
    }

    fn select(&self, index: usize, sampler: &mut Sampler) -> Result<&'a Record> {
        let records = self.table.records();
        match self.policy {
            LinkPolicy::Cycle => {
                if records.is_empty() {
                    return Err(GenerationError::EmptyPool);
                }
                Ok(&records[index % records.len()])
            }
            LinkPolicy::Random { prefix } => {
                let end = prefix.map_or(records.len(), |prefix| prefix.min(records.len()));
                sampler.one(&records[..end])
            }
        }
    }
}

/// Evaluates field plans into tables, linking children to parents.
///
/// Identifiers are allocated in a namespace named after the table, so the
/// same allocator may serve every table of a run.
pub struct EntityGraphBuilder<'a> {
    ids: &'a mut IdAllocator,
    sampler: &'a mut Sampler,
    references: Vec<&'a Table>,
}

impl<'a> EntityGraphBuilder<'a> {
    pub fn new(ids: &'a mut IdAllocator, sampler: &'a mut Sampler) -> Self {
        Self {
            ids,
            sampler,
            references: Vec::new(),
        }
    }

    /// Tables that `reference` steps may pick records from.
    pub fn with_references(mut self, tables: impl IntoIterator<Item = &'a Table>) -> Self {
        self.references.extend(tables);
        self
    }

    /// Build `count` records. Any failing step aborts the whole table; no
    /// partial table is returned.
    pub fn build(
        &mut self,
        name: &str,
        parent: Option<ParentLink<'_>>,
        count: usize,
        plan: &FieldPlan,
    ) -> Result<Table> {
        plan.validate(parent.is_some())?;

        let mut records = Vec::with_capacity(count);
        for index in 0..count {
            let parent_record = match &parent {
                Some(link) => Some(link.select(index, self.sampler)?),
                None => None,
            };
            let mut draft = RecordDraft::new(index, parent_record);
            for step in plan.steps() {
                let value = self
                    .evaluate(name, step, &draft)
                    .map_err(|err| err.in_field(&step.name))?;
                draft.push(step.name.clone(), value, step.hidden);
            }
            records.push(draft.finish());
        }
        Ok(Table::new(name, records))
    }

    fn evaluate(&mut self, table: &str, step: &FieldStep, draft: &RecordDraft<'_>) -> Result<Value> {
        match &step.rule {
            FieldRule::Identifier { pattern, partition } => {
                let namespace = match partition {
                    Some(field) => {
                        let value = draft.lookup(field)?;
                        let key = value.as_key().ok_or_else(|| {
                            GenerationError::InvalidPlan(format!(
                                "partition '{field}' holds a non-categorical value {value:?}"
                            ))
                        })?;
                        Namespace::partitioned(table, key)
                    }
                    None => Namespace::new(table),
                };
                let bindings = |name: &str| draft.get(name).and_then(Value::as_key);
                self.ids
                    .allocate_with(&namespace, pattern, self.sampler, &bindings)
                    .map(Value::Text)
            }
            FieldRule::Value(source) => source.resolve(draft, self.sampler),
            FieldRule::Scaled {
                base,
                factor,
                rounding,
            } => {
                let base = base.resolve(draft, self.sampler)?;
                let factor = factor.resolve(draft, self.sampler)?;
                conditional::scale(&base, &factor, *rounding)
            }
            FieldRule::Sum(terms) => {
                let values = terms
                    .iter()
                    .map(|term| term.resolve(draft, self.sampler))
                    .collect::<Result<Vec<_>>>()?;
                conditional::sum(&values)
            }
            FieldRule::Reference { table } => {
                let source = self
                    .references
                    .iter()
                    .find(|candidate| candidate.name() == table)
                    .ok_or_else(|| {
                        GenerationError::InvalidPlan(format!(
                            "referenced table '{table}' is not available"
                        ))
                    })?;
                let record = self.sampler.one(source.records())?;
                Ok(Value::Object(record.clone()))
            }
            FieldRule::Derived(derive) => (**derive)(draft, self.sampler),
        }
    }
}
