use std::fmt::{Display, Formatter};

use derive_getters::{Dissolve, Getters};
use derive_more::Constructor;
use ecodkit_core_rs::loc::Segment;
use ecodkit_core_rs::num::fraction;
use eyre::{ensure, Result};
use itertools::Itertools;

use crate::domain::Domain;
use crate::flags::Flag;
use crate::gaps::{self, GapSummary};
use crate::Range;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Stage {
    RawEvidence,
    Decomposed,
    Partitioned,
    GapAnalyzed,
    BoundaryOptimized,
    Final,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum GapKind {
    /// Between two domains (possibly the same discontinuous one).
    Interstitial,
    /// Between a domain and a chain end.
    Terminal,
    /// No domain on either side.
    Isolated,
}

impl Display for GapKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            GapKind::Interstitial => "interstitial",
            GapKind::Terminal => "terminal",
            GapKind::Isolated => "isolated",
        };
        write!(f, "{symbol}")
    }
}

/// Maximal run of residues that no domain claims.
#[derive(Clone, PartialEq, Eq, Debug, Constructor, Getters, Dissolve)]
pub struct UnassignedSegment {
    range: Segment<i64>,
    kind: GapKind,
    preceding: Option<String>,
    following: Option<String>,
}

impl UnassignedSegment {
    pub fn length(&self) -> i64 {
        self.range.len()
    }
}

/// Domains of a single chain together with everything left unassigned.
#[derive(Clone, PartialEq, Debug, Getters)]
pub struct DomainLayout {
    chain_length: i64,
    domains: Vec<Domain>,
    unassigned: Vec<UnassignedSegment>,
    gap_summary: GapSummary,
    coverage_fraction: f64,
    flags: Vec<Flag>,
    stage: Stage,
}

impl DomainLayout {
    /// Checked constructor: domains must be pairwise disjoint and lie within the chain.
    /// Domain ids must be unique.
    pub fn new(
        chain_length: i64,
        domains: Vec<Domain>,
        flags: Vec<Flag>,
        stage: Stage,
    ) -> Result<Self> {
        ensure!(chain_length >= 0, "Chain length must be non-negative, got {chain_length}");
        for domain in &domains {
            ensure!(
                !domain.assigned_range().is_empty() && domain.end() <= chain_length,
                "Domain {} ({}) is outside of the chain [1..{chain_length}]",
                domain.id(),
                domain.assigned_range()
            );
        }
        for (a, b) in domains.iter().tuple_combinations() {
            ensure!(a.id() != b.id(), "Duplicated domain id: {}", a.id());
            ensure!(
                !a.assigned_range().overlaps(b.assigned_range()),
                "Domains {} ({}) and {} ({}) overlap",
                a.id(),
                a.assigned_range(),
                b.id(),
                b.assigned_range()
            );
        }
        Ok(Self::assemble(chain_length, domains, flags, stage))
    }

    /// Callers guarantee the invariants checked by `new`.
    pub(crate) fn assemble(
        chain_length: i64,
        mut domains: Vec<Domain>,
        flags: Vec<Flag>,
        stage: Stage,
    ) -> Self {
        domains.sort_by_key(|x| x.start());
        let unassigned = gaps::classify(chain_length, &domains);
        let assigned: i64 = domains.iter().map(|x| x.length()).sum();
        Self {
            chain_length,
            coverage_fraction: fraction(assigned, chain_length),
            gap_summary: GapSummary::new(&unassigned),
            domains,
            unassigned,
            flags,
            stage,
        }
    }

    pub fn empty(chain_length: i64) -> Result<Self> {
        Self::new(chain_length, Vec::new(), Vec::new(), Stage::RawEvidence)
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub fn with_flags(mut self, flags: impl IntoIterator<Item = Flag>) -> Self {
        self.flags.extend(flags);
        self
    }

    pub fn domain(&self, id: &str) -> Option<&Domain> {
        self.domains.iter().find(|x| x.id() == id)
    }

    /// Domain owning the given residue, if any.
    pub fn owner(&self, pos: i64) -> Option<&Domain> {
        self.domains.iter().find(|x| x.assigned_range().contains(pos))
    }

    /// Union of all domain ranges.
    pub fn assigned(&self) -> Range {
        self.domains
            .iter()
            .fold(Range::empty(), |acc, x| acc.union(x.assigned_range()))
    }

    pub fn unassigned_length(&self) -> i64 {
        self.unassigned.iter().map(|x| x.length()).sum()
    }
}
