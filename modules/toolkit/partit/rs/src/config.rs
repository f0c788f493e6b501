use std::collections::BTreeMap;

use derive_getters::Getters;
use eyre::{ensure, Result};

use crate::boundary::{GapResolver, Midpoint};
use crate::evidence::{EvidenceKind, KindThresholds, QualityThresholds};

/// What to do with evidence whose reference coverage can't be computed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum InclusionPolicy {
    /// Keep it. Undefined coverage already ranks it below comparable evidence.
    #[default]
    Include,
    Exclude,
}

#[derive(Clone, Debug, Getters)]
pub struct Config {
    overlap_threshold: f64,
    max_small_gap_size: i64,
    minimum_domain_length: i64,
    merge_gap_tolerance: i64,
    confidence_floor: f64,
    incomplete_provenance: InclusionPolicy,
    decompose: bool,
    min_fragment_size: i64,
    discount_by_coverage: bool,
    merge_terminal_fragments: bool,
    quality: QualityThresholds,
    kind_thresholds: BTreeMap<EvidenceKind, KindThresholds>,
    gap_resolver: Box<dyn GapResolver>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            overlap_threshold: 0.2,
            max_small_gap_size: 8,
            minimum_domain_length: 25,
            merge_gap_tolerance: 5,
            confidence_floor: 0.0,
            incomplete_provenance: InclusionPolicy::Include,
            decompose: true,
            min_fragment_size: 20,
            discount_by_coverage: true,
            merge_terminal_fragments: true,
            quality: QualityThresholds::default(),
            kind_thresholds: BTreeMap::new(),
            gap_resolver: Box::new(Midpoint),
        }
    }
}

fn is_fraction(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_overlap_threshold(&mut self, threshold: f64) -> Result<&mut Self> {
        ensure!(
            is_fraction(threshold),
            "Overlap threshold must be within [0, 1], got {threshold}"
        );
        self.overlap_threshold = threshold;
        Ok(self)
    }

    pub fn set_max_small_gap_size(&mut self, size: i64) -> Result<&mut Self> {
        ensure!(size >= 0, "Small gap size must be non-negative, got {size}");
        self.max_small_gap_size = size;
        Ok(self)
    }

    pub fn set_minimum_domain_length(&mut self, length: i64) -> Result<&mut Self> {
        ensure!(length >= 1, "Minimum domain length must be positive, got {length}");
        self.minimum_domain_length = length;
        Ok(self)
    }

    pub fn set_merge_gap_tolerance(&mut self, tolerance: i64) -> Result<&mut Self> {
        ensure!(
            tolerance >= 0,
            "Merge gap tolerance must be non-negative, got {tolerance}"
        );
        self.merge_gap_tolerance = tolerance;
        Ok(self)
    }

    pub fn set_confidence_floor(&mut self, floor: f64) -> Result<&mut Self> {
        ensure!(is_fraction(floor), "Confidence floor must be within [0, 1], got {floor}");
        self.confidence_floor = floor;
        Ok(self)
    }

    pub fn set_incomplete_provenance(&mut self, policy: InclusionPolicy) -> &mut Self {
        self.incomplete_provenance = policy;
        self
    }

    pub fn set_decompose(&mut self, decompose: bool) -> &mut Self {
        self.decompose = decompose;
        self
    }

    pub fn set_min_fragment_size(&mut self, size: i64) -> Result<&mut Self> {
        ensure!(size >= 1, "Minimum fragment size must be positive, got {size}");
        self.min_fragment_size = size;
        Ok(self)
    }

    pub fn set_discount_by_coverage(&mut self, discount: bool) -> &mut Self {
        self.discount_by_coverage = discount;
        self
    }

    pub fn set_merge_terminal_fragments(&mut self, merge: bool) -> &mut Self {
        self.merge_terminal_fragments = merge;
        self
    }

    pub fn set_quality(&mut self, thresholds: QualityThresholds) -> &mut Self {
        self.quality = thresholds;
        self
    }

    pub fn set_kind_thresholds(
        &mut self,
        kind: EvidenceKind,
        thresholds: KindThresholds,
    ) -> Result<&mut Self> {
        ensure!(
            is_fraction(*thresholds.min_confidence()),
            "Minimum confidence for {kind} must be within [0, 1], got {}",
            thresholds.min_confidence()
        );
        ensure!(
            *thresholds.min_reference_coverage() >= 0.0,
            "Minimum reference coverage for {kind} must be non-negative, got {}",
            thresholds.min_reference_coverage()
        );
        self.kind_thresholds.insert(kind, thresholds);
        Ok(self)
    }

    pub fn set_gap_resolver(&mut self, resolver: Box<dyn GapResolver>) -> &mut Self {
        self.gap_resolver = resolver;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::ToConfident;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(*config.overlap_threshold(), 0.2);
        assert_eq!(*config.max_small_gap_size(), 8);
        assert_eq!(*config.minimum_domain_length(), 25);
        assert_eq!(*config.merge_gap_tolerance(), 5);
        assert_eq!(*config.min_fragment_size(), 20);
        assert_eq!(*config.incomplete_provenance(), InclusionPolicy::Include);
        assert!(*config.decompose() && *config.discount_by_coverage());
        assert!(*config.merge_terminal_fragments());
        assert!(config.kind_thresholds().is_empty());
    }

    #[test]
    fn test_setters() -> Result<()> {
        let mut config = Config::new();
        config
            .set_overlap_threshold(0.3)?
            .set_max_small_gap_size(0)?
            .set_minimum_domain_length(40)?
            .set_decompose(false)
            .set_gap_resolver(Box::new(ToConfident));
        assert_eq!(*config.overlap_threshold(), 0.3);
        assert_eq!(*config.minimum_domain_length(), 40);
        assert!(!config.decompose());

        assert!(config.set_overlap_threshold(1.2).is_err());
        assert!(config.set_max_small_gap_size(-1).is_err());
        assert!(config.set_minimum_domain_length(0).is_err());
        assert!(config.set_merge_gap_tolerance(-5).is_err());
        assert!(config.set_confidence_floor(f64::NAN).is_err());
        assert!(config
            .set_kind_thresholds(EvidenceKind::RemoteHomology, KindThresholds::new(2.0, 0.0))
            .is_err());

        // Failed setters leave the previous value
        assert_eq!(*config.overlap_threshold(), 0.3);

        let copy = config.clone();
        assert_eq!(format!("{:?}", copy.gap_resolver()), "ToConfident");
        Ok(())
    }
}
