use derive_getters::Getters;
use ecodkit_core_rs::loc::Segment;
use ecodkit_core_rs::num::fraction;
use eyre::{ensure, Result};

use crate::config::Config;
use crate::domain::Domain;
use crate::evidence::{canonical_order, quality_tier, Evidence, QualityThresholds};
use crate::layout::{DomainLayout, Stage};
use crate::Range;

/// Accepted domain while the pool is being processed.
struct Claim {
    range: Range,
    primary: Evidence,
    supporting: Vec<Evidence>,
    merged: bool,
}

/// Greedy resolution of the evidence pool into non-overlapping domains.
///
/// Candidates are visited in the canonical order. A candidate that belongs to the same
/// reference as an accepted, linked domain is merged into it. Any other candidate becomes
/// a new domain if its overlap with the already claimed residues doesn't exceed the
/// threshold, and is rejected otherwise.
///
/// Each domain is graded by the quality tier of its primary evidence.
#[derive(Clone, Copy, PartialEq, Debug, Getters)]
pub struct Partitioner {
    overlap_threshold: f64,
    minimum_domain_length: i64,
    merge_gap_tolerance: i64,
    quality: QualityThresholds,
}

impl Partitioner {
    pub fn new(
        overlap_threshold: f64,
        minimum_domain_length: i64,
        merge_gap_tolerance: i64,
    ) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&overlap_threshold),
            "Overlap threshold must be within [0, 1], got {overlap_threshold}"
        );
        ensure!(
            minimum_domain_length >= 1 && merge_gap_tolerance >= 0,
            "Invalid partitioner settings: minimum length {minimum_domain_length}, \
             merge tolerance {merge_gap_tolerance}"
        );
        Ok(Self {
            overlap_threshold,
            minimum_domain_length,
            merge_gap_tolerance,
            quality: QualityThresholds::default(),
        })
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            overlap_threshold: *config.overlap_threshold(),
            minimum_domain_length: *config.minimum_domain_length(),
            merge_gap_tolerance: *config.merge_gap_tolerance(),
            quality: *config.quality(),
        }
    }

    pub fn with_quality(mut self, thresholds: QualityThresholds) -> Self {
        self.quality = thresholds;
        self
    }

    pub fn partition(&self, pool: &[Evidence], chain_length: i64) -> Result<DomainLayout> {
        ensure!(chain_length >= 0, "Chain length must be non-negative, got {chain_length}");
        let chain = match Segment::new(1, chain_length) {
            Ok(chain) => Range::from(chain),
            Err(_) => Range::empty(),
        };

        let mut order: Vec<&Evidence> = pool.iter().collect();
        order.sort_by(|a, b| canonical_order(a, b));

        let mut claims: Vec<Claim> = Vec::new();
        let mut claimed = Range::empty();
        for candidate in order {
            let query = candidate.query_range().intersect(&chain);
            if query.is_empty() {
                continue;
            }
            let fresh = query.subtract(&claimed);

            let linked = self.linked_claim(&claims, &claimed, candidate.reference_id(), &query);
            if let Some(ind) = linked {
                let claim = &mut claims[ind];
                if !fresh.is_empty() {
                    log::debug!(
                        "Merging {} ({}) into {} ({})",
                        candidate.reference_id(),
                        fresh,
                        claim.primary.reference_id(),
                        claim.range
                    );
                    claim.range = claim.range.union(&fresh);
                    claim.merged = true;
                    claimed = claimed.union(&fresh);
                }
                claim.supporting.push(candidate.clone());
                continue;
            }

            let overlap = fraction(query.overlap_length(&claimed), query.total_length());
            if overlap > self.overlap_threshold {
                log::debug!(
                    "Rejecting {} ({}): overlap {overlap:.3} > {}",
                    candidate.reference_id(),
                    query,
                    self.overlap_threshold
                );
                continue;
            }
            if fresh.total_length() < self.minimum_domain_length {
                log::debug!(
                    "Rejecting {} ({}): {} unclaimed residues",
                    candidate.reference_id(),
                    query,
                    fresh.total_length()
                );
                continue;
            }

            claimed = claimed.union(&fresh);
            claims.push(Claim {
                range: fresh,
                primary: candidate.clone(),
                supporting: Vec::new(),
                merged: false,
            });
        }

        claims.sort_by_key(|x| x.range.start());
        let domains: Vec<Domain> = claims
            .into_iter()
            .enumerate()
            .map(|(ind, claim)| {
                let discontinuous = claim.merged && claim.range.is_discontinuous();
                let quality = quality_tier(&claim.primary, &self.quality);
                Domain::assemble(
                    format!("d{}", ind + 1),
                    claim.range,
                    claim.primary,
                    claim.supporting,
                    discontinuous,
                    quality,
                )
            })
            .collect();

        log::debug!(
            "Partitioned {} candidates into {} domains over {chain_length} residues",
            pool.len(),
            domains.len()
        );
        Ok(DomainLayout::assemble(chain_length, domains, Vec::new(), Stage::Partitioned))
    }

    /// First claim (by position) of the same reference that the candidate is linked to.
    ///
    /// Linked means the ranges overlap or touch, or the residues between them are claimed by
    /// other domains except for at most `merge_gap_tolerance` unclaimed ones.
    fn linked_claim(
        &self,
        claims: &[Claim],
        claimed: &Range,
        reference_id: &str,
        query: &Range,
    ) -> Option<usize> {
        let span = query.span()?;
        claims
            .iter()
            .enumerate()
            .filter(|(_, claim)| claim.primary.reference_id() == reference_id)
            .filter(|(_, claim)| {
                let Some(hull) = claim.range.span().map(|x| x.hull(&span)) else {
                    return false;
                };
                let between = Range::from(hull)
                    .subtract(&claim.range)
                    .subtract(query)
                    .subtract(claimed);
                claim.range.overlaps(query) || between.total_length() <= self.merge_gap_tolerance
            })
            .min_by_key(|(_, claim)| claim.range.start())
            .map(|(ind, _)| ind)
    }
}
