use ecodkit_core_rs::loc::SequenceRange;

pub use boundary::{BoundaryOptimizer, GapResolver, Midpoint, ToConfident};
pub use config::{Config, InclusionPolicy};
pub use decompose::Decomposer;
pub use domain::{BoundaryAdjustment, Domain, Rule};
pub use engine::{Engine, EngineBuilder, Job};
pub use evidence::{
    populate_provenance, Evidence, EvidenceBuilder, EvidenceKind, EvidenceRecord,
    QualityThresholds, QualityTier,
};
pub use flags::Flag;
pub use gaps::GapSummary;
pub use layout::{DomainLayout, GapKind, Stage, UnassignedSegment};
pub use partition::Partitioner;
pub use pipeline::Pipeline;
pub use reference::{DomainReference, ReferenceTables};

mod boundary;
mod config;
mod decompose;
mod domain;
mod engine;
pub mod evidence;
mod flags;
pub mod gaps;
mod layout;
mod partition;
mod pipeline;
mod reference;

/// Residue ranges on protein chains are 1-based and fit comfortably into i64.
pub type Range = SequenceRange<i64>;
