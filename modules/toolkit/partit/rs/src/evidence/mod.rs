use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use derive_getters::Getters;
use eyre::{ensure, eyre, Report, Result};

pub use alignment::Alignment;
pub use quality::{
    canonical_order, quality_tier, sort_canonical, KindThresholds, QualityThresholds, QualityTier,
};
pub use record::{ingest, EvidenceRecord};

use crate::Range;

mod alignment;
mod quality;
mod record;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum EvidenceKind {
    /// Alignment of the query against a whole reference chain.
    ChainAlignment,
    /// Alignment against a single reference domain.
    DomainAlignment,
    /// Profile-profile / remote homology hit against a reference domain.
    RemoteHomology,
}

impl EvidenceKind {
    pub const ALL: [EvidenceKind; 3] = [
        EvidenceKind::ChainAlignment,
        EvidenceKind::DomainAlignment,
        EvidenceKind::RemoteHomology,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            EvidenceKind::ChainAlignment => "chain_alignment",
            EvidenceKind::DomainAlignment => "domain_alignment",
            EvidenceKind::RemoteHomology => "remote_homology",
        }
    }
}

impl Display for EvidenceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for EvidenceKind {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chain_alignment" | "chain_blast" | "chain" => Ok(EvidenceKind::ChainAlignment),
            "domain_alignment" | "domain_blast" | "domain" => Ok(EvidenceKind::DomainAlignment),
            "remote_homology" | "hhsearch" | "hhblits" => Ok(EvidenceKind::RemoteHomology),
            _ => Err(eyre!("Unknown evidence kind: '{s}'")),
        }
    }
}

/// A single piece of alignment evidence suggesting that part of the query chain
/// corresponds to a known reference.
///
/// Evidence is immutable once built: every derived value (coverage, provenance status)
/// is computed from the stored fields, and stages that need a different evidence
/// (decomposition, clipping, provenance filling) create a new one.
#[derive(Clone, PartialEq, Debug, Getters)]
pub struct Evidence {
    kind: EvidenceKind,
    query_range: Range,
    reference_id: String,
    reference_length: Option<i64>,
    hit_range: Range,
    confidence: f64,
    raw_score: Option<f64>,
    evalue: Option<f64>,
    #[getter(skip)]
    alignment: Option<Arc<Alignment>>,
    #[getter(skip)]
    parent: Option<Arc<Evidence>>,
}

impl Evidence {
    pub fn builder(
        kind: EvidenceKind,
        reference_id: impl Into<String>,
        query_range: Range,
        hit_range: Range,
    ) -> EvidenceBuilder {
        EvidenceBuilder {
            kind,
            reference_id: reference_id.into(),
            query_range,
            hit_range,
            reference_length: None,
            confidence: 0.0,
            raw_score: None,
            evalue: None,
            alignment: None,
            parent: None,
        }
    }

    pub fn alignment(&self) -> Option<&Alignment> {
        self.alignment.as_deref()
    }

    /// Chain-level evidence this fragment was decomposed from.
    pub fn parent(&self) -> Option<&Evidence> {
        self.parent.as_deref()
    }

    pub fn is_fragment(&self) -> bool {
        self.parent.is_some()
    }

    /// Fraction of the reference covered by the hit range. Undefined without a positive
    /// reference length.
    pub fn reference_coverage(&self) -> Option<f64> {
        match self.reference_length {
            Some(length) if length > 0 => {
                Some(self.hit_range.total_length() as f64 / length as f64)
            }
            _ => None,
        }
    }

    pub fn incomplete_provenance(&self) -> bool {
        self.reference_coverage().is_none()
    }

    pub fn query_length(&self) -> i64 {
        self.query_range.total_length()
    }

    /// Same evidence restricted to the given query residues. None if nothing is left.
    pub(crate) fn restricted(&self, within: &Range) -> Option<Self> {
        let query_range = self.query_range.intersect(within);
        if query_range.is_empty() {
            return None;
        }
        if query_range == self.query_range {
            return Some(self.clone());
        }
        Some(Self {
            query_range,
            ..self.clone()
        })
    }
}

/// Returns a copy of the evidence with the provided hit range and reference length.
/// Missing values keep what the evidence already has. A missing or non-positive
/// reference length leaves the coverage undefined, marking the result as having
/// incomplete provenance.
pub fn populate_provenance(
    evidence: &Evidence,
    hit_range: Option<Range>,
    reference_length: Option<i64>,
) -> Evidence {
    let mut result = evidence.clone();
    if let Some(hit_range) = hit_range.filter(|x| !x.is_empty()) {
        result.hit_range = hit_range;
    }
    if reference_length.is_some() {
        result.reference_length = reference_length;
    }
    result
}

pub struct EvidenceBuilder {
    kind: EvidenceKind,
    reference_id: String,
    query_range: Range,
    hit_range: Range,
    reference_length: Option<i64>,
    confidence: f64,
    raw_score: Option<f64>,
    evalue: Option<f64>,
    alignment: Option<Arc<Alignment>>,
    parent: Option<Arc<Evidence>>,
}

impl EvidenceBuilder {
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn reference_length(mut self, length: i64) -> Self {
        self.reference_length = Some(length);
        self
    }

    pub fn raw_score(mut self, score: f64) -> Self {
        self.raw_score = Some(score);
        self
    }

    pub fn evalue(mut self, evalue: f64) -> Self {
        self.evalue = Some(evalue);
        self
    }

    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(Arc::new(alignment));
        self
    }

    pub fn parent(mut self, parent: Arc<Evidence>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn build(self) -> Result<Evidence> {
        ensure!(
            !self.reference_id.trim().is_empty(),
            "Evidence must reference a non-empty reference id"
        );
        ensure!(
            !self.query_range.is_empty(),
            "Evidence for '{}' has an empty query range",
            self.reference_id
        );
        ensure!(
            !self.hit_range.is_empty(),
            "Evidence for '{}' has an empty hit range",
            self.reference_id
        );
        ensure!(
            (0.0..=1.0).contains(&self.confidence),
            "Evidence confidence must be within [0, 1], got {} for '{}'",
            self.confidence,
            self.reference_id
        );
        if let Some(evalue) = self.evalue {
            ensure!(
                evalue >= 0.0,
                "E-value must be non-negative, got {evalue} for '{}'",
                self.reference_id
            );
        }

        Ok(Evidence {
            kind: self.kind,
            query_range: self.query_range,
            reference_id: self.reference_id,
            reference_length: self.reference_length,
            hit_range: self.hit_range,
            confidence: self.confidence,
            raw_score: self.raw_score,
            evalue: self.evalue,
            alignment: self.alignment,
            parent: self.parent,
        })
    }
}
