use ahash::{HashMap, HashSet};
use derive_getters::Getters;
use eyre::{ensure, Result};

use crate::Range;

/// Reference domain defined on a reference chain.
#[derive(Clone, PartialEq, Debug, Getters)]
pub struct DomainReference {
    domain_id: String,
    range: Range,
    length: i64,
}

impl DomainReference {
    /// `range` is in reference-chain coordinates, `length` is the full length of the domain.
    pub fn new(domain_id: impl Into<String>, range: Range, length: i64) -> Result<Self> {
        let domain_id = domain_id.into();
        ensure!(!domain_id.trim().is_empty(), "Reference domain id must not be empty");
        ensure!(!range.is_empty(), "Reference domain '{domain_id}' has an empty range");
        ensure!(
            length > 0,
            "Reference domain '{domain_id}' must have a positive length, got {length}"
        );
        Ok(Self {
            domain_id,
            range,
            length,
        })
    }
}

/// Read-only lookup tables shared by every chain of a run.
#[derive(Clone, Debug, Default)]
pub struct ReferenceTables {
    lengths: HashMap<String, i64>,
    constituents: Option<HashMap<String, Vec<DomainReference>>>,
    labels: HashMap<String, String>,
    blacklist: HashSet<String>,
}

impl ReferenceTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_lengths(mut self, lengths: impl IntoIterator<Item = (String, i64)>) -> Self {
        self.lengths.extend(lengths);
        self
    }

    /// Registers the constituent domains of reference chains. Calling this at all, even with
    /// no entries, marks the constituent table as available.
    pub fn add_constituents(
        mut self,
        constituents: impl IntoIterator<Item = (String, Vec<DomainReference>)>,
    ) -> Self {
        let table = self.constituents.get_or_insert_with(Default::default);
        for (chain, domains) in constituents {
            let entry = table.entry(chain).or_default();
            entry.extend(domains);
            entry.sort_by(|a, b| {
                a.range
                    .start()
                    .cmp(&b.range.start())
                    .then_with(|| a.domain_id.cmp(&b.domain_id))
            });
        }
        self
    }

    pub fn add_labels(mut self, labels: impl IntoIterator<Item = (String, String)>) -> Self {
        self.labels.extend(labels);
        self
    }

    /// References that must never be used as evidence, e.g. obsolete or misannotated chains.
    pub fn add_blacklist(mut self, references: impl IntoIterator<Item = String>) -> Self {
        self.blacklist.extend(references);
        self
    }

    pub fn reference_length(&self, reference_id: &str) -> Option<i64> {
        self.lengths.get(reference_id).copied()
    }

    pub fn has_constituent_table(&self) -> bool {
        self.constituents.is_some()
    }

    /// Constituent domains of a reference chain, ordered by their start on the reference.
    pub fn constituents(&self, reference_id: &str) -> Option<&[DomainReference]> {
        self.constituents
            .as_ref()?
            .get(reference_id)
            .map(|x| x.as_slice())
    }

    /// Classification label of a reference, kept for downstream consumers.
    pub fn label(&self, reference_id: &str) -> Option<&str> {
        self.labels.get(reference_id).map(|x| x.as_str())
    }

    pub fn is_blacklisted(&self, reference_id: &str) -> bool {
        self.blacklist.contains(reference_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables() -> Result<()> {
        let tables = ReferenceTables::new();
        assert!(!tables.has_constituent_table());
        assert_eq!(tables.constituents("1abcA"), None);

        let tables = tables
            .add_lengths([("e1abcA1".to_string(), 120)])
            .add_constituents([(
                "1abcA".to_string(),
                vec![
                    DomainReference::new("e1abcA2", Range::parse("121-250")?, 130)?,
                    DomainReference::new("e1abcA1", Range::parse("1-120")?, 120)?,
                ],
            )])
            .add_labels([("e1abcA1".to_string(), "3.40.50".to_string())])
            .add_blacklist(["2xyzB".to_string()]);

        assert!(tables.has_constituent_table());
        assert_eq!(tables.reference_length("e1abcA1"), Some(120));
        assert_eq!(tables.reference_length("e1abcA2"), None);
        assert_eq!(tables.label("e1abcA1"), Some("3.40.50"));
        assert!(tables.is_blacklisted("2xyzB"));
        assert!(!tables.is_blacklisted("1abcA"));

        let ids: Vec<_> = tables
            .constituents("1abcA")
            .unwrap()
            .iter()
            .map(|x| x.domain_id().as_str())
            .collect();
        assert_eq!(ids, ["e1abcA1", "e1abcA2"]);
        Ok(())
    }

    #[test]
    fn test_domain_reference_validation() -> Result<()> {
        assert!(DomainReference::new("", Range::parse("1-10")?, 10).is_err());
        assert!(DomainReference::new("d", Range::empty(), 10).is_err());
        assert!(DomainReference::new("d", Range::parse("1-10")?, 0).is_err());
        Ok(())
    }
}
