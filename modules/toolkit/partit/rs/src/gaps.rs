use derive_getters::Getters;
use ecodkit_core_rs::loc::Segment;

use crate::domain::Domain;
use crate::layout::{DomainLayout, GapKind, Stage, UnassignedSegment};
use crate::Range;

/// Every maximal unclaimed run of the chain, classified by its neighbours.
pub fn analyze(layout: &DomainLayout) -> Vec<UnassignedSegment> {
    classify(*layout.chain_length(), layout.domains())
}

pub(crate) fn classify(chain_length: i64, domains: &[Domain]) -> Vec<UnassignedSegment> {
    let chain = match Segment::new(1, chain_length) {
        Ok(chain) => chain,
        Err(_) => return Vec::new(),
    };
    let assigned = domains
        .iter()
        .fold(Range::empty(), |acc, x| acc.union(x.assigned_range()));

    let owner = |pos: i64| {
        domains
            .iter()
            .find(|x| x.assigned_range().contains(pos))
            .map(|x| x.id().clone())
    };

    assigned
        .complement(chain)
        .segments()
        .iter()
        .map(|gap| {
            let preceding = owner(gap.start() - 1);
            let following = owner(gap.end() + 1);
            let kind = match (&preceding, &following) {
                (Some(_), Some(_)) => GapKind::Interstitial,
                (None, None) => GapKind::Isolated,
                _ => GapKind::Terminal,
            };
            UnassignedSegment::new(*gap, kind, preceding, following)
        })
        .collect()
}

/// Moves the layout to the gap-analyzed stage. Unassigned segments and their summary
/// are kept on the layout itself.
pub fn annotate(layout: DomainLayout) -> DomainLayout {
    let summary = layout.gap_summary();
    log::debug!(
        "Gap analysis: {} gaps, {} unassigned residues ({} interstitial, {} terminal, {} isolated)",
        summary.gaps,
        summary.total_unassigned,
        summary.interstitial,
        summary.terminal,
        summary.isolated
    );
    layout.with_stage(Stage::GapAnalyzed)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Getters)]
pub struct GapSummary {
    gaps: usize,
    total_unassigned: i64,
    interstitial: usize,
    terminal: usize,
    isolated: usize,
    largest: i64,
}

impl GapSummary {
    pub fn new(unassigned: &[UnassignedSegment]) -> Self {
        let mut summary = Self {
            gaps: unassigned.len(),
            ..Default::default()
        };
        for gap in unassigned {
            summary.total_unassigned += gap.length();
            summary.largest = summary.largest.max(gap.length());
            match gap.kind() {
                GapKind::Interstitial => summary.interstitial += 1,
                GapKind::Terminal => summary.terminal += 1,
                GapKind::Isolated => summary.isolated += 1,
            }
        }
        summary
    }
}
