use std::cmp::Ordering;

use derive_getters::Getters;
use derive_more::Constructor;
use eyre::{ensure, Result};

use super::Evidence;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum QualityTier {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, PartialEq, Debug, Getters)]
pub struct QualityThresholds {
    high_confidence: f64,
    medium_confidence: f64,
    high_score: f64,
    medium_score: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            high_confidence: 0.8,
            medium_confidence: 0.5,
            high_score: 50.0,
            medium_score: 25.0,
        }
    }
}

impl QualityThresholds {
    pub fn new(
        high_confidence: f64,
        medium_confidence: f64,
        high_score: f64,
        medium_score: f64,
    ) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&medium_confidence)
                && (0.0..=1.0).contains(&high_confidence)
                && medium_confidence <= high_confidence,
            "Confidence tiers must satisfy 0 <= medium ({medium_confidence}) \
             <= high ({high_confidence}) <= 1"
        );
        ensure!(
            medium_score <= high_score,
            "Score tiers must satisfy medium ({medium_score}) <= high ({high_score})"
        );
        Ok(Self {
            high_confidence,
            medium_confidence,
            high_score,
            medium_score,
        })
    }
}

fn tier(value: f64, high: f64, medium: f64) -> QualityTier {
    if value >= high {
        QualityTier::High
    } else if value >= medium {
        QualityTier::Medium
    } else {
        QualityTier::Low
    }
}

/// Quality tier of the evidence: the lower of its confidence tier and, when a raw score
/// is available, its score tier.
pub fn quality_tier(evidence: &Evidence, thresholds: &QualityThresholds) -> QualityTier {
    let by_confidence = tier(
        *evidence.confidence(),
        thresholds.high_confidence,
        thresholds.medium_confidence,
    );
    match evidence.raw_score() {
        Some(score) => {
            by_confidence.min(tier(*score, thresholds.high_score, thresholds.medium_score))
        }
        None => by_confidence,
    }
}

/// Per-kind admission gate applied before partitioning.
#[derive(Clone, Copy, PartialEq, Debug, Default, Constructor, Getters)]
pub struct KindThresholds {
    min_confidence: f64,
    min_reference_coverage: f64,
}

impl KindThresholds {
    /// Evidence without a defined coverage passes the coverage gate only when it is disabled.
    pub fn admits(&self, evidence: &Evidence) -> bool {
        if *evidence.confidence() < self.min_confidence {
            return false;
        }
        match evidence.reference_coverage() {
            Some(coverage) => coverage >= self.min_reference_coverage,
            None => self.min_reference_coverage <= 0.0,
        }
    }
}

/// Priority of evidence during partitioning: confidence desc, then reference coverage
/// desc (undefined after any defined value), then query length desc. Reference id and
/// query range break the remaining ties, so the order never depends on the input order.
pub fn canonical_order(a: &Evidence, b: &Evidence) -> Ordering {
    b.confidence()
        .total_cmp(a.confidence())
        .then_with(|| match (a.reference_coverage(), b.reference_coverage()) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.query_length().cmp(&a.query_length()))
        .then_with(|| a.reference_id().cmp(b.reference_id()))
        .then_with(|| a.query_range().cmp(b.query_range()))
}

pub fn sort_canonical(pool: &mut [Evidence]) {
    pool.sort_by(canonical_order);
}
