use std::sync::Arc;

use derive_getters::Getters;
use ecodkit_core_rs::loc::Segment;
use eyre::{ensure, eyre, Result};

use crate::boundary::BoundaryOptimizer;
use crate::config::{Config, InclusionPolicy};
use crate::decompose::Decomposer;
use crate::evidence::{ingest, populate_provenance, Evidence, EvidenceKind, EvidenceRecord};
use crate::flags::Flag;
use crate::gaps;
use crate::layout::{DomainLayout, Stage};
use crate::partition::Partitioner;
use crate::reference::ReferenceTables;
use crate::Range;

/// Full single-chain workflow: evidence preparation, decomposition, partitioning,
/// gap analysis and boundary optimization.
#[derive(Clone, Debug, Getters)]
pub struct Pipeline {
    config: Config,
    tables: Arc<ReferenceTables>,
}

impl Pipeline {
    pub fn new(config: Config, tables: Arc<ReferenceTables>) -> Self {
        Self { config, tables }
    }

    pub fn run_records(
        &self,
        chain_length: i64,
        records: impl IntoIterator<Item = EvidenceRecord>,
    ) -> Result<DomainLayout> {
        let (evidence, flags) = ingest(records);
        self._run(chain_length, evidence, flags)
    }

    pub fn run(
        &self,
        chain_length: i64,
        evidence: impl IntoIterator<Item = Evidence>,
    ) -> Result<DomainLayout> {
        self._run(chain_length, evidence.into_iter().collect(), Vec::new())
    }

    fn _run(
        &self,
        chain_length: i64,
        evidence: Vec<Evidence>,
        mut flags: Vec<Flag>,
    ) -> Result<DomainLayout> {
        ensure!(chain_length >= 0, "Chain length must be non-negative, got {chain_length}");
        let pool = self.clip(chain_length, evidence, &mut flags);
        let pool = self.fill_provenance(pool);
        let pool = match *self.config.decompose() {
            true => self.decompose(pool, &mut flags)?,
            false => pool,
        };
        let pool = self.filter(pool, &mut flags);
        log::debug!("{} candidates left for partitioning", pool.len());

        let layout = Partitioner::from_config(&self.config)
            .partition(&pool, chain_length)?
            .with_flags(flags);
        let layout = gaps::annotate(layout);
        let layout = BoundaryOptimizer::new(&self.config).optimize(&layout);
        Ok(layout.with_stage(Stage::Final))
    }

    fn clip(
        &self,
        chain_length: i64,
        evidence: Vec<Evidence>,
        flags: &mut Vec<Flag>,
    ) -> Vec<Evidence> {
        let chain = match Segment::new(1, chain_length) {
            Ok(chain) => Range::from(chain),
            Err(_) => Range::empty(),
        };

        let mut pool = Vec::with_capacity(evidence.len());
        for (item, x) in evidence.into_iter().enumerate() {
            match x.restricted(&chain) {
                Some(clipped) => pool.push(clipped),
                None => {
                    log::warn!(
                        "Dropping {} ({}): outside of the chain [1..{chain_length}]",
                        x.reference_id(),
                        x.query_range()
                    );
                    flags.push(Flag::MalformedEvidence {
                        item,
                        reason: format!("query range {} is outside of the chain", x.query_range()),
                    });
                }
            }
        }
        pool
    }

    fn fill_provenance(&self, pool: Vec<Evidence>) -> Vec<Evidence> {
        pool.into_iter()
            .map(|x| match x.reference_length() {
                Some(_) => x,
                None => match self.tables.reference_length(x.reference_id()) {
                    Some(length) => populate_provenance(&x, None, Some(length)),
                    None => x,
                },
            })
            .collect()
    }

    fn decompose(&self, pool: Vec<Evidence>, flags: &mut Vec<Flag>) -> Result<Vec<Evidence>> {
        let has_chain_hits = pool.iter().any(|x| {
            *x.kind() == EvidenceKind::ChainAlignment
                && !self.tables.is_blacklisted(x.reference_id())
        });
        if !has_chain_hits {
            return Ok(pool);
        }
        if !self.tables.has_constituent_table() {
            return Err(eyre!(
                "Chain-level evidence requires a constituent-domain table \
                 when decomposition is enabled"
            ));
        }

        let decomposer = Decomposer::from_config(&self.config);
        let mut result = Vec::with_capacity(pool.len());
        for evidence in pool {
            // Blacklisted hits are dropped by the filter
            if *evidence.kind() != EvidenceKind::ChainAlignment
                || self.tables.is_blacklisted(evidence.reference_id())
            {
                result.push(evidence);
                continue;
            }
            let fragments = decomposer.decompose(&evidence, &self.tables);
            if fragments.is_empty() {
                log::debug!(
                    "Keeping {} ({}) as a single candidate",
                    evidence.reference_id(),
                    evidence.query_range()
                );
                flags.push(Flag::DecompositionMiss {
                    reference_id: evidence.reference_id().clone(),
                });
                result.push(evidence);
            } else {
                result.extend(fragments);
            }
        }
        Ok(result)
    }

    fn filter(&self, pool: Vec<Evidence>, flags: &mut Vec<Flag>) -> Vec<Evidence> {
        let floor = *self.config.confidence_floor();
        let mut result = Vec::with_capacity(pool.len());
        for evidence in pool {
            let reference_id = evidence.reference_id().clone();
            let confidence = *evidence.confidence();

            let blacklisted = std::iter::once(&evidence)
                .chain(evidence.parent())
                .map(|x| x.reference_id())
                .find(|x| self.tables.is_blacklisted(x));
            if let Some(blacklisted) = blacklisted {
                log::debug!("Dropping {reference_id}: {blacklisted} is blacklisted");
                flags.push(Flag::BlacklistedReference {
                    reference_id: blacklisted.clone(),
                });
                continue;
            }

            let admitted = self
                .config
                .kind_thresholds()
                .get(evidence.kind())
                .is_none_or(|gate| gate.admits(&evidence));
            if confidence < floor || !admitted {
                flags.push(Flag::BelowConfidenceFloor {
                    reference_id,
                    confidence,
                });
                continue;
            }

            if evidence.incomplete_provenance() {
                log::debug!("Incomplete provenance for {reference_id}");
                match self.config.incomplete_provenance() {
                    InclusionPolicy::Include => {
                        flags.push(Flag::IncompleteProvenance { reference_id });
                    }
                    InclusionPolicy::Exclude => {
                        flags.push(Flag::ExcludedIncompleteProvenance { reference_id });
                        continue;
                    }
                }
            }
            result.push(evidence);
        }
        result
    }
}
