use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Submission,
    Application,
    Company,
    Job,
    Evaluation,
    Cycle,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Submission => "submission",
            EntityType::Application => "application",
            EntityType::Company => "company",
            EntityType::Job => "job",
            EntityType::Evaluation => "evaluation",
            EntityType::Cycle => "cycle",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
