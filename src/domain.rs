use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Sample,
    Experiment,
    Run,
}

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [RecordKind::Sample, RecordKind::Experiment, RecordKind::Run];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Sample => "sample",
            RecordKind::Experiment => "experiment",
            RecordKind::Run => "run",
        }
    }

    pub fn element_name(&self) -> &'static str {
        match self {
            RecordKind::Sample => "SAMPLE",
            RecordKind::Experiment => "EXPERIMENT",
            RecordKind::Run => "RUN",
        }
    }

    // Tried in sample, experiment, run order.
    pub fn from_member_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| name.contains(kind.as_str()))
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub type Attributes = BTreeMap<String, Vec<Option<String>>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub taxid: Option<i64>,
    pub scientific_name: Option<String>,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    pub sample_accession: Option<String>,
    pub description: Option<String>,
    pub library_name: Option<String>,
    pub library_strategy: Option<String>,
    pub library_source: Option<String>,
    pub library_selection: Option<String>,
    pub library_layout: String,
    pub platform_type: String,
    pub platform_instrument_model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub experiment_accession: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    Sample { id: String, sample: Sample },
    Experiment { id: String, experiment: Experiment },
    Run { id: String, run: Run },
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Sample { .. } => RecordKind::Sample,
            Record::Experiment { .. } => RecordKind::Experiment,
            Record::Run { .. } => RecordKind::Run,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Record::Sample { id, .. } | Record::Experiment { id, .. } | Record::Run { id, .. } => {
                id
            }
        }
    }
}

impl From<(String, Sample)> for Record {
    fn from((id, sample): (String, Sample)) -> Self {
        Record::Sample { id, sample }
    }
}

impl From<(String, Experiment)> for Record {
    fn from((id, experiment): (String, Experiment)) -> Self {
        Record::Experiment { id, experiment }
    }
}

impl From<(String, Run)> for Record {
    fn from((id, run): (String, Run)) -> Self {
        Record::Run { id, run }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_member_names() {
        assert_eq!(
            RecordKind::from_member_name("SRA000001/SRA000001.sample.xml"),
            Some(RecordKind::Sample)
        );
        assert_eq!(
            RecordKind::from_member_name("SRA000001/SRA000001.experiment.xml"),
            Some(RecordKind::Experiment)
        );
        assert_eq!(
            RecordKind::from_member_name("SRA000001/SRA000001.run.xml"),
            Some(RecordKind::Run)
        );
        assert_eq!(
            RecordKind::from_member_name("SRA000001/SRA000001.submission.xml"),
            None
        );
    }
}
