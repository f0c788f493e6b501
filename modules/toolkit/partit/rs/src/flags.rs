use std::fmt::{Display, Formatter};

use crate::Range;

/// Non-fatal findings accumulated while a chain moves through the pipeline.
#[derive(Clone, PartialEq, Debug)]
pub enum Flag {
    /// An evidence item could not be parsed or lies outside the chain. The item was dropped.
    MalformedEvidence { item: usize, reason: String },
    /// No usable reference length, so the reference coverage is undefined.
    IncompleteProvenance { reference_id: String },
    /// Incomplete-provenance evidence removed by the inclusion policy.
    ExcludedIncompleteProvenance { reference_id: String },
    /// Evidence removed by the confidence floor or a per-kind quality gate.
    BelowConfidenceFloor { reference_id: String, confidence: f64 },
    /// Evidence against a blacklisted reference, directly or through its parent chain hit.
    BlacklistedReference { reference_id: String },
    /// A chain-level hit could not be split into constituent domains and was kept whole.
    DecompositionMiss { reference_id: String },
    /// Domain removed by the boundary optimizer for being too short.
    DomainDropped { domain: String, range: Range },
}

impl Display for Flag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Flag::MalformedEvidence { item, reason } => {
                write!(f, "malformed evidence #{item}: {reason}")
            }
            Flag::IncompleteProvenance { reference_id } => {
                write!(f, "incomplete provenance for {reference_id}")
            }
            Flag::ExcludedIncompleteProvenance { reference_id } => {
                write!(f, "excluded {reference_id} (incomplete provenance)")
            }
            Flag::BelowConfidenceFloor {
                reference_id,
                confidence,
            } => write!(f, "{reference_id} filtered out (confidence {confidence})"),
            Flag::BlacklistedReference { reference_id } => {
                write!(f, "{reference_id} is blacklisted")
            }
            Flag::DecompositionMiss { reference_id } => {
                write!(f, "no decomposition for {reference_id}")
            }
            Flag::DomainDropped { domain, range } => write!(f, "dropped {domain} ({range})"),
        }
    }
}
