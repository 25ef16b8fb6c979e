#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Logging {
    /// Optional path to the log file. Logs go to stderr when unset.
    pub file: Option<PathBuf>,
}
