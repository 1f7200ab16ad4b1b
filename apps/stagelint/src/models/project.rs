//! Schema of `<tool> show project <name> --json` output.
//!
//! Only the `targets` map is read; everything else the tool prints is
//! ignored.

use serde::Deserialize;
use serde_json::Value as Json;
use std::collections::BTreeMap;

#[derive(Debug, Default, Deserialize)]
/// Project details reported by the orchestration tool.
pub struct ProjectDetails {
    #[serde(default)]
    pub targets: BTreeMap<String, Json>,
}

impl ProjectDetails {
    /// Whether the project exposes a `lint` target.
    pub fn has_lint_target(&self) -> bool {
        self.targets.contains_key("lint")
    }
}
