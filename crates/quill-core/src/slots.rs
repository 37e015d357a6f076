use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The fixed set of workflow output keys. One slot per specialist agent;
/// a new write overwrites the previous value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputSlot {
    Ideas,
    Outline,
    Draft,
    Feedback,
    SeoResult,
}

impl OutputSlot {
    pub const ALL: [OutputSlot; 5] = [
        OutputSlot::Ideas,
        OutputSlot::Outline,
        OutputSlot::Draft,
        OutputSlot::Feedback,
        OutputSlot::SeoResult,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSlot::Ideas => "ideas",
            OutputSlot::Outline => "outline",
            OutputSlot::Draft => "draft",
            OutputSlot::Feedback => "feedback",
            OutputSlot::SeoResult => "seo-result",
        }
    }
}

impl fmt::Display for OutputSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputSlot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ideas" => Ok(OutputSlot::Ideas),
            "outline" => Ok(OutputSlot::Outline),
            "draft" => Ok(OutputSlot::Draft),
            "feedback" => Ok(OutputSlot::Feedback),
            "seo-result" => Ok(OutputSlot::SeoResult),
            other => Err(Error::UnknownOutputKey(other.to_string())),
        }
    }
}

/// Workflow stages in canonical order. The order is presentational only;
/// nothing enforces that stages are produced in this sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Ideate,
    Outline,
    Draft,
    Feedback,
    Seo,
}

impl Stage {
    pub const ORDER: [Stage; 5] = [
        Stage::Ideate,
        Stage::Outline,
        Stage::Draft,
        Stage::Feedback,
        Stage::Seo,
    ];

    /// The slot this stage is complete by.
    pub fn slot(&self) -> OutputSlot {
        match self {
            Stage::Ideate => OutputSlot::Ideas,
            Stage::Outline => OutputSlot::Outline,
            Stage::Draft => OutputSlot::Draft,
            Stage::Feedback => OutputSlot::Feedback,
            Stage::Seo => OutputSlot::SeoResult,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Ideate => "ideate",
            Stage::Outline => "outline",
            Stage::Draft => "draft",
            Stage::Feedback => "feedback",
            Stage::Seo => "seo",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
