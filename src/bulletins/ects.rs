//! Static ECTS credit defaults, loaded once from a JSON file.
//!
//! The file maps a template key ("M1-S1", "M2-S3-MAGI", ...) to a list whose
//! first element holds the configured credit per subject slot, keyed
//! "ECTS1".."ECTSn".

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub(crate) struct EctsTable(HashMap<String, Vec<HashMap<String, u32>>>);

impl EctsTable {
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading ECTS table at {}", path.display()))?;
        let table = serde_json::from_str(&raw)
            .with_context(|| format!("parsing ECTS table at {}", path.display()))?;
        Ok(table)
    }

    /// Credit defaults for one template key; empty when the key is unknown.
    pub(crate) fn defaults_for(&self, key: &str) -> EctsDefaults<'_> {
        EctsDefaults(self.0.get(key).and_then(|entries| entries.first()))
    }

    #[cfg(test)]
    pub(crate) fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct EctsDefaults<'a>(Option<&'a HashMap<String, u32>>);

impl EctsDefaults<'_> {
    /// Configured credit of a 1-based subject slot, if any.
    pub(crate) fn credit(&self, subject: usize) -> Option<u32> {
        self.0
            .and_then(|entry| entry.get(&format!("ECTS{subject}")))
            .copied()
    }
}
