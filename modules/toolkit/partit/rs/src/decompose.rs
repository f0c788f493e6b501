use std::collections::BTreeMap;
use std::sync::Arc;

use derive_getters::Getters;
use ecodkit_core_rs::num::fraction;
use eyre::{ensure, Result};
use itertools::Itertools;

use crate::config::Config;
use crate::evidence::{Evidence, EvidenceKind};
use crate::reference::{DomainReference, ReferenceTables};
use crate::Range;

/// Splits chain-level hits into per-domain fragments using the constituent domains
/// of the reference chain.
#[derive(Clone, Copy, PartialEq, Debug, Getters)]
pub struct Decomposer {
    min_fragment_size: i64,
    discount_by_coverage: bool,
}

impl Decomposer {
    pub fn new(min_fragment_size: i64, discount_by_coverage: bool) -> Result<Self> {
        ensure!(
            min_fragment_size >= 1,
            "Minimum fragment size must be positive, got {min_fragment_size}"
        );
        Ok(Self {
            min_fragment_size,
            discount_by_coverage,
        })
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            min_fragment_size: *config.min_fragment_size(),
            discount_by_coverage: *config.discount_by_coverage(),
        }
    }

    /// Fragments of the chain-level evidence, one per constituent domain that maps onto at
    /// least `min_fragment_size` query residues. Fragments never leave the parent query range.
    ///
    /// An empty result means the hit could not be decomposed: there is no definition for the
    /// reference chain, the residue mapping failed, or no constituent was covered well enough.
    pub fn decompose(&self, evidence: &Evidence, tables: &ReferenceTables) -> Vec<Evidence> {
        if *evidence.kind() != EvidenceKind::ChainAlignment {
            return Vec::new();
        }
        let constituents = match tables.constituents(evidence.reference_id()) {
            Some(constituents) if !constituents.is_empty() => constituents,
            _ => {
                log::debug!("No constituent domains for {}", evidence.reference_id());
                return Vec::new();
            }
        };
        let mapping = match residue_mapping(evidence) {
            Ok(mapping) => mapping,
            Err(err) => {
                log::debug!("Can't map residues of {}: {err}", evidence.reference_id());
                return Vec::new();
            }
        };

        let parent = Arc::new(evidence.clone());
        constituents
            .iter()
            .filter_map(|constituent| self.fragment(&parent, constituent, &mapping, tables))
            .collect()
    }

    fn fragment(
        &self,
        parent: &Arc<Evidence>,
        constituent: &DomainReference,
        mapping: &BTreeMap<i64, i64>,
        tables: &ReferenceTables,
    ) -> Option<Evidence> {
        let (hit, query): (Vec<i64>, Vec<i64>) = constituent
            .range()
            .positions()
            .filter_map(|pos| mapping.get(&pos).map(|q| (pos, *q)))
            .filter(|(_, q)| parent.query_range().contains(*q))
            .unzip();

        let mapped = query.len() as i64;
        if mapped < self.min_fragment_size {
            log::debug!(
                "Skipping {} in {}: {mapped} mapped residues, {} required",
                constituent.domain_id(),
                parent.reference_id(),
                self.min_fragment_size
            );
            return None;
        }

        let coverage = fraction(mapped, constituent.range().total_length()).min(1.0);
        let confidence = match self.discount_by_coverage {
            true => parent.confidence() * coverage,
            false => *parent.confidence(),
        };
        let reference_length = tables
            .reference_length(constituent.domain_id())
            .unwrap_or(*constituent.length());

        let mut builder = Evidence::builder(
            EvidenceKind::DomainAlignment,
            constituent.domain_id().clone(),
            Range::from_positions(query).ok()?,
            Range::from_positions(hit).ok()?,
        )
        .confidence(confidence)
        .reference_length(reference_length)
        .parent(parent.clone());
        if let Some(evalue) = parent.evalue() {
            builder = builder.evalue(*evalue);
        }

        match builder.build() {
            Ok(fragment) => Some(fragment),
            Err(err) => {
                log::debug!("Invalid fragment {}: {err}", constituent.domain_id());
                None
            }
        }
    }
}

/// Reference position -> query position for every aligned residue pair.
///
/// Gapped alignment strings are used when available. Otherwise corresponding query/hit
/// segments are aligned without gaps, starting from their first residues.
fn residue_mapping(evidence: &Evidence) -> Result<BTreeMap<i64, i64>> {
    let pairs = match evidence.alignment() {
        Some(alignment) => alignment.residue_pairs()?,
        None => {
            let (query, hit) = (evidence.query_range().segments(), evidence.hit_range().segments());
            ensure!(
                query.len() == hit.len(),
                "{} query segments can't be paired with {} hit segments",
                query.len(),
                hit.len()
            );
            query
                .iter()
                .zip(hit)
                .flat_map(|(q, h)| {
                    let length = q.len().min(h.len());
                    (0..length).map(move |offset| (q.start() + offset, h.start() + offset))
                })
                .collect_vec()
        }
    };

    let mut mapping = BTreeMap::new();
    for (query, hit) in pairs {
        mapping.entry(hit).or_insert(query);
    }
    Ok(mapping)
}
