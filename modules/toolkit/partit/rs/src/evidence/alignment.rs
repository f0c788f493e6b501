use derive_getters::Getters;
use derive_more::Constructor;
use eyre::{ensure, Result};

/// Gapped pairwise alignment between the query and a reference chain.
/// Start positions are 1-based and refer to the first aligned residue of each sequence.
#[derive(Clone, PartialEq, Eq, Debug, Constructor, Getters)]
pub struct Alignment {
    query_seq: String,
    hit_seq: String,
    query_start: i64,
    hit_start: i64,
}

fn is_gap(symbol: u8) -> bool {
    symbol == b'-' || symbol == b'.'
}

impl Alignment {
    /// Pairs of (query, hit) positions for every column where both sequences carry a residue.
    pub fn residue_pairs(&self) -> Result<Vec<(i64, i64)>> {
        ensure!(
            self.query_seq.len() == self.hit_seq.len(),
            "Alignment strings differ in length: {} vs {}",
            self.query_seq.len(),
            self.hit_seq.len()
        );
        ensure!(
            self.query_start >= 1 && self.hit_start >= 1,
            "Alignment start positions are 1-based, got {} and {}",
            self.query_start,
            self.hit_start
        );

        let mut pairs = Vec::with_capacity(self.query_seq.len());
        let (mut query, mut hit) = (self.query_start, self.hit_start);
        for (q, h) in self.query_seq.bytes().zip(self.hit_seq.bytes()) {
            match (is_gap(q), is_gap(h)) {
                (false, false) => {
                    pairs.push((query, hit));
                    query += 1;
                    hit += 1;
                }
                (false, true) => query += 1,
                (true, false) => hit += 1,
                (true, true) => {}
            }
        }
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_residue_pairs() -> Result<()> {
        let alignment = Alignment::new("AC-DE".into(), "A-GDE".into(), 10, 1);
        assert_eq!(alignment.residue_pairs()?, vec![(10, 1), (12, 3), (13, 4)]);

        let broken = Alignment::new("ACDE".into(), "ACD".into(), 1, 1);
        assert!(broken.residue_pairs().is_err());
        Ok(())
    }
}
