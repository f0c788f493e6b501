use derive_getters::Getters;
use ecodkit_core_rs::loc::Segment;

pub use resolver::{GapResolver, Midpoint, ToConfident};

use crate::config::Config;
use crate::domain::{Domain, Rule};
use crate::flags::Flag;
use crate::gaps;
use crate::layout::{DomainLayout, GapKind, Stage};
use crate::Range;

mod resolver;

/// Post-partition clean-up of domain boundaries.
///
/// Rules are applied in a fixed order:
/// 1. domains shorter than the minimum length are dropped (unless grown by a discontinuous merge);
/// 2. small interstitial gaps go wholly to the higher-confidence flank;
/// 3. larger interstitial gaps that are still too short to be a domain are split by the resolver;
/// 4. terminal gaps too short to be a domain join their only neighbour.
///
/// Gaps that survive all rules can't be touched by any of them, so a second run is a no-op.
#[derive(Clone, Debug, Getters)]
pub struct BoundaryOptimizer {
    max_small_gap_size: i64,
    minimum_domain_length: i64,
    merge_terminal_fragments: bool,
    resolver: Box<dyn GapResolver>,
}

impl BoundaryOptimizer {
    pub fn new(config: &Config) -> Self {
        Self {
            max_small_gap_size: *config.max_small_gap_size(),
            minimum_domain_length: *config.minimum_domain_length(),
            merge_terminal_fragments: *config.merge_terminal_fragments(),
            resolver: config.gap_resolver().clone(),
        }
    }

    pub fn optimize(&self, layout: &DomainLayout) -> DomainLayout {
        let chain_length = *layout.chain_length();
        let mut flags = layout.flags().clone();

        let mut domains = Vec::with_capacity(layout.domains().len());
        for domain in layout.domains() {
            if domain.length() >= self.minimum_domain_length || *domain.discontinuous_merge() {
                domains.push(domain.clone());
            } else {
                log::debug!(
                    "Dropping domain {} ({}): {} residues is below the minimum of {}",
                    domain.id(),
                    domain.assigned_range(),
                    domain.length(),
                    self.minimum_domain_length
                );
                flags.push(Flag::DomainDropped {
                    domain: domain.id().clone(),
                    range: domain.assigned_range().clone(),
                });
            }
        }

        // Gaps are disjoint and only ever added to their own flanks: one pass resolves them all
        for gap in gaps::classify(chain_length, &domains) {
            let (preceding, following) = (
                gap.preceding().as_deref().and_then(|id| index_of(&domains, id)),
                gap.following().as_deref().and_then(|id| index_of(&domains, id)),
            );
            let span = *gap.range();

            match (gap.kind(), preceding, following) {
                (GapKind::Interstitial, Some(p), Some(f))
                    if gap.length() <= self.max_small_gap_size =>
                {
                    let target = if domains[p].confidence() >= domains[f].confidence() {
                        p
                    } else {
                        f
                    };
                    assign(&mut domains, target, span, Rule::SmallGapMerge);
                }
                (GapKind::Interstitial, Some(p), Some(f))
                    if gap.length() < self.minimum_domain_length =>
                {
                    if p == f {
                        assign(&mut domains, p, span, Rule::InterstitialSplit);
                        continue;
                    }
                    let head = self
                        .resolver
                        .split(&span, &domains[p], &domains[f])
                        .clamp(0, span.len());
                    let (start, end) = (span.start(), span.end());
                    if let Ok(residues) = Segment::new(start, start + head - 1) {
                        assign(&mut domains, p, residues, Rule::InterstitialSplit);
                    }
                    if let Ok(residues) = Segment::new(start + head, end) {
                        assign(&mut domains, f, residues, Rule::InterstitialSplit);
                    }
                }
                (GapKind::Terminal, Some(neighbour), None)
                | (GapKind::Terminal, None, Some(neighbour))
                    if self.merge_terminal_fragments
                        && gap.length() < self.minimum_domain_length =>
                {
                    assign(&mut domains, neighbour, span, Rule::TerminalMerge);
                }
                _ => {}
            }
        }

        log::debug!(
            "Boundary optimization: {} of {} domains kept",
            domains.len(),
            layout.domains().len()
        );
        DomainLayout::assemble(chain_length, domains, flags, Stage::BoundaryOptimized)
    }
}

fn index_of(domains: &[Domain], id: &str) -> Option<usize> {
    domains.iter().position(|x| x.id() == id)
}

fn assign(domains: &mut [Domain], target: usize, residues: Segment<i64>, rule: Rule) {
    domains[target] = domains[target].extended(Range::from(residues), rule);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tests::domain;
    use crate::evidence::QualityTier;
    use eyre::Result;

    fn optimize(config: &Config, chain_length: i64, domains: Vec<Domain>) -> Result<DomainLayout> {
        let layout = DomainLayout::new(chain_length, domains, vec![], Stage::GapAnalyzed)?;
        Ok(BoundaryOptimizer::new(config).optimize(&layout))
    }

    fn ranges(layout: &DomainLayout) -> Vec<String> {
        layout
            .domains()
            .iter()
            .map(|x| x.assigned_range().to_string())
            .collect()
    }

    #[test]
    fn test_small_gap_merge() -> Result<()> {
        let config = Config::default();
        let layout = optimize(
            &config,
            120,
            vec![domain("d1", "1-50", 0.9), domain("d2", "57-120", 0.8)],
        )?;
        assert_eq!(ranges(&layout), ["1-56", "57-120"]);
        assert!(layout.unassigned().is_empty());
        assert_eq!(layout.stage(), &Stage::BoundaryOptimized);

        let adjustment = &layout.domains()[0].audit_trail()[0];
        assert_eq!(adjustment.rule(), &Rule::SmallGapMerge);
        assert_eq!(adjustment.residues(), &[(51, 56)]);

        // Ties go to the N-terminal flank, lower confidence loses the gap
        let tie = vec![domain("d1", "1-50", 0.8), domain("d2", "57-120", 0.8)];
        assert_eq!(ranges(&optimize(&config, 120, tie)?), ["1-56", "57-120"]);
        let weaker = vec![domain("d1", "1-50", 0.5), domain("d2", "57-120", 0.8)];
        let weaker = optimize(&config, 120, weaker)?;
        assert_eq!(ranges(&weaker), ["1-50", "51-120"]);
        Ok(())
    }

    #[test]
    fn test_interstitial_split() -> Result<()> {
        let config = Config::default();
        // 15 residues: above the small-gap limit, below the minimum domain length
        let domains = vec![domain("d1", "1-50", 0.9), domain("d2", "66-130", 0.8)];
        let layout = optimize(&config, 130, domains)?;
        assert_eq!(ranges(&layout), ["1-58", "59-130"]);
        assert_eq!(layout.domains()[1].audit_trail()[0].rule(), &Rule::InterstitialSplit);

        // Large gaps may hold an unclassified domain and stay unassigned
        let domains = vec![domain("d1", "1-50", 0.9), domain("d2", "101-200", 0.8)];
        let layout = optimize(&config, 200, domains)?;
        assert_eq!(ranges(&layout), ["1-50", "101-200"]);
        assert_eq!(layout.unassigned().len(), 1);
        assert_eq!(layout.unassigned()[0].range(), &(51, 100));

        let mut config = Config::default();
        config.set_gap_resolver(Box::new(ToConfident));
        let domains = vec![domain("d1", "1-50", 0.5), domain("d2", "66-130", 0.8)];
        let layout = optimize(&config, 130, domains)?;
        assert_eq!(ranges(&layout), ["1-50", "51-130"]);
        Ok(())
    }

    #[test]
    fn test_terminal_merge() -> Result<()> {
        let mut config = Config::default();
        let domains = vec![domain("d1", "6-60", 0.9), domain("d2", "61-100", 0.8)];
        let layout = optimize(&config, 108, domains.clone())?;
        assert_eq!(ranges(&layout), ["1-60", "61-108"]);
        assert_eq!(layout.domains()[0].audit_trail()[0].rule(), &Rule::TerminalMerge);

        // Any terminal fragment shorter than a domain is merged
        let layout = optimize(&config, 130, vec![domain("d1", "16-130", 0.9)])?;
        assert_eq!(ranges(&layout), ["1-130"]);
        assert_eq!(layout.domains()[0].audit_trail()[0].residues(), &[(1, 15)]);
        let layout = optimize(&config, 124, vec![domain("d1", "1-100", 0.9)])?;
        assert_eq!(ranges(&layout), ["1-124"]);

        // A terminal gap that could hold a domain stays unassigned
        let layout = optimize(&config, 125, vec![domain("d1", "1-100", 0.9)])?;
        assert_eq!(ranges(&layout), ["1-100"]);
        assert_eq!(layout.unassigned()[0].range(), &(101, 125));

        config.set_merge_terminal_fragments(false);
        let layout = optimize(&config, 108, domains)?;
        assert_eq!(ranges(&layout), ["6-60", "61-100"]);
        assert_eq!(layout.unassigned().len(), 2);
        Ok(())
    }

    #[test]
    fn test_short_domains() -> Result<()> {
        let config = Config::default();
        let layout = optimize(
            &config,
            200,
            vec![
                domain("d1", "1-100", 0.9),
                domain("d2", "101-103", 0.95),
                domain("d3", "104-200", 0.8),
            ],
        )?;

        // The 3-residue domain is dropped and its residues go to the stronger flank
        assert_eq!(ranges(&layout), ["1-103", "104-200"]);
        assert_eq!(
            layout.flags(),
            &[Flag::DomainDropped {
                domain: "d2".into(),
                range: Range::parse("101-103")?
            }]
        );
        Ok(())
    }

    #[test]
    fn test_discontinuous_gap() -> Result<()> {
        let config = Config::default();
        let merged = Domain::assemble(
            "d1".into(),
            Range::parse("1-40,51-100")?,
            domain("x", "1-40", 0.9).primary_evidence().clone(),
            vec![],
            true,
            QualityTier::High,
        );
        let layout = optimize(&config, 100, vec![merged])?;
        assert_eq!(ranges(&layout), ["1-100"]);
        Ok(())
    }

    #[test]
    fn test_idempotent() -> Result<()> {
        let config = Config::default();
        let once = optimize(
            &config,
            300,
            vec![
                domain("d1", "4-50", 0.7),
                domain("d2", "53-60", 0.9),
                domain("d3", "70-140", 0.6),
                domain("d4", "200-290", 0.8),
            ],
        )?;
        let optimizer = BoundaryOptimizer::new(&config);
        let twice = optimizer.optimize(&once);
        assert_eq!(once, twice);
        Ok(())
    }
}
