use crate::{compositor::FragmentPlacement, numbering::Numbering};
use serde::{Deserialize, Serialize};

/// One image that could not be used, with a human-readable reason.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageIssue {
    pub file: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    pub position: u32,
    pub file: String,
    pub numbering: Numbering,
    pub strip_fraction: Option<f64>,
    pub fragments: Vec<FragmentPlacement>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentReport {
    pub page_count: usize,
    pub images: Vec<ImageReport>,
    pub issues: Vec<ImageIssue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveReport {
    pub entries: Vec<String>,
    pub issues: Vec<ImageIssue>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub input_count: usize,
    /// Inputs left out while loading the batch.
    pub skipped: Vec<ImageIssue>,
    pub document: Option<DocumentReport>,
    pub archive: Option<ArchiveReport>,
    pub errors: Vec<String>,
}
