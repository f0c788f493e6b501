use std::fmt::{Display, Formatter};

use derive_getters::{Dissolve, Getters};
use derive_more::Constructor;
use eyre::{ensure, Result};

use crate::evidence::{quality_tier, Evidence, QualityThresholds, QualityTier};
use crate::Range;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Rule {
    SmallGapMerge,
    InterstitialSplit,
    TerminalMerge,
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Rule::SmallGapMerge => "small_gap_merge",
            Rule::InterstitialSplit => "interstitial_split",
            Rule::TerminalMerge => "terminal_merge",
        };
        write!(f, "{symbol}")
    }
}

/// Single boundary change applied to a domain.
#[derive(Clone, PartialEq, Eq, Debug, Constructor, Getters, Dissolve)]
pub struct BoundaryAdjustment {
    rule: Rule,
    residues: Range,
    before: Range,
    after: Range,
}

#[derive(Clone, PartialEq, Debug, Getters)]
pub struct Domain {
    id: String,
    assigned_range: Range,
    primary_evidence: Evidence,
    supporting_evidence: Vec<Evidence>,
    confidence: f64,
    quality: QualityTier,
    discontinuous_merge: bool,
    audit_trail: Vec<BoundaryAdjustment>,
}

impl Domain {
    /// Quality of the domain is graded with the default tier thresholds.
    pub fn new(
        id: impl Into<String>,
        assigned_range: Range,
        primary_evidence: Evidence,
    ) -> Result<Self> {
        let id = id.into();
        ensure!(!assigned_range.is_empty(), "Domain {id} must cover at least one residue");
        let quality = quality_tier(&primary_evidence, &QualityThresholds::default());
        Ok(Self::assemble(id, assigned_range, primary_evidence, Vec::new(), false, quality))
    }

    pub(crate) fn assemble(
        id: String,
        assigned_range: Range,
        primary_evidence: Evidence,
        supporting_evidence: Vec<Evidence>,
        discontinuous_merge: bool,
        quality: QualityTier,
    ) -> Self {
        Self {
            id,
            assigned_range,
            confidence: *primary_evidence.confidence(),
            quality,
            primary_evidence,
            supporting_evidence,
            discontinuous_merge,
            audit_trail: Vec::new(),
        }
    }

    pub fn reference_id(&self) -> &str {
        self.primary_evidence.reference_id()
    }

    pub fn start(&self) -> i64 {
        self.assigned_range.start().unwrap_or_default()
    }

    pub fn end(&self) -> i64 {
        self.assigned_range.end().unwrap_or_default()
    }

    pub fn length(&self) -> i64 {
        self.assigned_range.total_length()
    }

    /// Domain grown by the given residues, with the change recorded in the audit trail.
    pub(crate) fn extended(&self, residues: Range, rule: Rule) -> Self {
        let after = self.assigned_range.union(&residues);
        let mut result = self.clone();
        result.audit_trail.push(BoundaryAdjustment::new(
            rule,
            residues,
            self.assigned_range.clone(),
            after.clone(),
        ));
        result.assigned_range = after;
        result
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::evidence::EvidenceKind;

    pub(crate) fn domain(id: &str, range: &str, confidence: f64) -> Domain {
        let range: Range = range.parse().unwrap();
        let reference = format!("ref-{id}");
        let evidence = Evidence::builder(
            EvidenceKind::DomainAlignment,
            reference,
            range.clone(),
            range.clone(),
        )
        .confidence(confidence)
        .build()
        .unwrap();
        Domain::new(id, range, evidence).unwrap()
    }

    #[test]
    fn test_extended() -> Result<()> {
        let original = domain("d1", "1-50", 0.9);
        let grown = original.extended(Range::parse("51-56")?, Rule::SmallGapMerge);

        assert_eq!(grown.assigned_range(), &Range::parse("1-56")?);
        assert_eq!(grown.length(), 56);
        assert_eq!(
            grown.audit_trail(),
            &[BoundaryAdjustment::new(
                Rule::SmallGapMerge,
                Range::parse("51-56")?,
                Range::parse("1-50")?,
                Range::parse("1-56")?,
            )]
        );
        // Source domain is left intact
        assert!(original.audit_trail().is_empty());
        assert_eq!(original.length(), 50);
        Ok(())
    }

    #[test]
    fn test_new() -> Result<()> {
        let evidence = domain("d1", "1-50", 0.9).primary_evidence().clone();
        assert!(Domain::new("d2", Range::empty(), evidence.clone()).is_err());

        let domain = Domain::new("d2", Range::parse("5-20,40-60")?, evidence)?;
        assert_eq!((domain.start(), domain.end(), domain.length()), (5, 60, 37));
        assert_eq!(domain.reference_id(), "ref-d1");
        assert_eq!(*domain.confidence(), 0.9);
        assert_eq!(domain.quality(), &QualityTier::High);
        Ok(())
    }
}
