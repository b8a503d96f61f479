//! Batch reporting: per-object outcomes and terminal formatting.

use std::path::PathBuf;

use serde::Serialize;
use serde::ser::SerializeStruct;

use crate::domain::{Epoch, OutputCurve};
use crate::error::SkipReason;
use crate::io::table::RowError;

pub mod format;

pub use format::*;

/// A successfully processed object.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedObject {
    pub period: f64,
    pub epoch: Epoch,
    pub n_samples: usize,
    /// Light-curve rows dropped during ingest.
    pub skipped_rows: usize,
    pub curve_file: Option<PathBuf>,
    /// Written artifact path; `None` for estimate-only runs.
    pub output: Option<PathBuf>,
    #[serde(skip)]
    pub curve: Option<OutputCurve>,
}

/// Result of one object's pipeline.
#[derive(Debug, Clone)]
pub struct ObjectOutcome {
    pub name: String,
    pub result: Result<ProcessedObject, SkipReason>,
}

impl ObjectOutcome {
    pub fn is_processed(&self) -> bool {
        self.result.is_ok()
    }
}

impl Serialize for ObjectOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ObjectOutcome", 3)?;
        s.serialize_field("name", &self.name)?;
        match &self.result {
            Ok(processed) => {
                s.serialize_field("status", "processed")?;
                s.serialize_field("result", processed)?;
            }
            Err(reason) => {
                s.serialize_field("status", "skipped")?;
                s.serialize_field("reason", reason)?;
            }
        }
        s.end()
    }
}

/// Everything a `fold` / `estimate` run produced.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub manifest: PathBuf,
    pub manifest_rows: usize,
    pub duplicates: usize,
    pub manifest_row_errors: Vec<RowError>,
    pub outcomes: Vec<ObjectOutcome>,
}

impl BatchReport {
    pub fn processed(&self) -> impl Iterator<Item = (&str, &ProcessedObject)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|p| (o.name.as_str(), p)))
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &SkipReason)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|r| (o.name.as_str(), r)))
    }

    pub fn processed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_processed()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.processed_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FoldError;

    #[test]
    fn outcome_json_is_tagged_by_status() {
        let skipped = ObjectOutcome {
            name: "X".to_string(),
            result: Err(SkipReason::CurveNotFound),
        };
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"]["kind"], "CurveNotFound");

        let processed = ObjectOutcome {
            name: "Y".to_string(),
            result: Ok(ProcessedObject {
                period: 1.5,
                epoch: Epoch::external(10.0),
                n_samples: 3,
                skipped_rows: 0,
                curve_file: None,
                output: None,
                curve: None,
            }),
        };
        let json = serde_json::to_value(&processed).unwrap();
        assert_eq!(json["status"], "processed");
        assert_eq!(json["result"]["epoch"]["source"], "external");
        assert_eq!(json["result"]["period"], 1.5);
    }

    #[test]
    fn counts_split_processed_and_skipped() {
        let report = BatchReport {
            manifest: PathBuf::from("m.csv"),
            manifest_rows: 2,
            duplicates: 0,
            manifest_row_errors: Vec::new(),
            outcomes: vec![
                ObjectOutcome {
                    name: "A".to_string(),
                    result: Err(FoldError::InvalidPeriod("missing".to_string()).into()),
                },
                ObjectOutcome {
                    name: "B".to_string(),
                    result: Err(SkipReason::CurveNotFound),
                },
            ],
        };
        assert_eq!(report.processed_count(), 0);
        assert_eq!(report.skipped_count(), 2);
        let kinds: Vec<&str> = report.skipped().map(|(_, r)| r.kind()).collect();
        assert_eq!(kinds, vec!["InvalidPeriod", "CurveNotFound"]);
    }
}
