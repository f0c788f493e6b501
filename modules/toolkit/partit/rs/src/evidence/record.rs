use eyre::{Result, WrapErr};

use super::{Alignment, Evidence, EvidenceKind};
use crate::flags::Flag;
use crate::Range;

/// Loosely typed evidence as delivered by upstream parsers: ranges are still strings.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct EvidenceRecord {
    pub kind: String,
    pub reference_id: String,
    pub query_range: String,
    pub hit_range: String,
    pub reference_length: Option<i64>,
    pub confidence: f64,
    pub raw_score: Option<f64>,
    pub evalue: Option<f64>,
    pub alignment: Option<Alignment>,
}

impl EvidenceRecord {
    pub fn parse(&self) -> Result<Evidence> {
        let kind: EvidenceKind = self.kind.parse()?;
        let query_range = Range::parse(&self.query_range).wrap_err("Invalid query range")?;
        let hit_range = Range::parse(&self.hit_range).wrap_err("Invalid hit range")?;

        let mut builder = Evidence::builder(kind, self.reference_id.trim(), query_range, hit_range)
            .confidence(self.confidence);
        if let Some(length) = self.reference_length {
            builder = builder.reference_length(length);
        }
        if let Some(score) = self.raw_score {
            builder = builder.raw_score(score);
        }
        if let Some(evalue) = self.evalue {
            builder = builder.evalue(evalue);
        }
        if let Some(alignment) = &self.alignment {
            builder = builder.alignment(alignment.clone());
        }
        builder.build()
    }
}

/// Converts records into evidence. A malformed record drops only itself and leaves a flag.
pub fn ingest(records: impl IntoIterator<Item = EvidenceRecord>) -> (Vec<Evidence>, Vec<Flag>) {
    let mut evidence = Vec::new();
    let mut flags = Vec::new();
    for (item, record) in records.into_iter().enumerate() {
        match record.parse() {
            Ok(parsed) => evidence.push(parsed),
            Err(err) => {
                log::warn!(
                    "Dropping evidence #{item} ({}): {err:#}",
                    record.reference_id
                );
                flags.push(Flag::MalformedEvidence {
                    item,
                    reason: format!("{err:#}"),
                });
            }
        }
    }
    (evidence, flags)
}
