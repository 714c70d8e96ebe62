//! Correlated mock-data engine.
//!
//! Tables are built from ordered field plans: identifiers come from the
//! [`IdAllocator`], draws from a seedable [`Sampler`], and outcome-dependent
//! fields from [`PolicyTable`] lookups. [`EntityGraphBuilder`] links child
//! records to an already generated parent table, and [`GenerationEngine`]
//! runs whole domains into a run directory.

pub mod conditional;
pub mod engine;
pub mod graph;
pub mod ids;
pub mod model;
pub mod output;
pub mod plan;
pub mod sampler;

pub use conditional::{Policy, PolicyTable, RangePolicy, Rounding, resolve, scale};
pub use engine::{
    Domain, DomainOutcome, DomainRun, GenerationContext, GenerationEngine, GenerationResult,
    hash_seed, run_dir,
};
pub use graph::{EntityGraphBuilder, LinkPolicy, ParentLink};
pub use ids::{IdAllocator, IdPattern, Namespace};
pub use model::{GenerateOptions, GenerationReport, OutputFormat, TableReport, TableStatus};
pub use plan::{FieldPlan, FieldRef, RecordCount, RecordDraft, Source, TableSpec};
pub use sampler::Sampler;

pub use mockgraph_core::{GenerationError, Record, Result, Table, Value};
