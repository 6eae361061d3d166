//! Named instruction library.
//!
//! Stores (instruction, judge instruction) pairs under a human-chosen
//! category name so operators can reuse vetted prompts. Persisted as
//! pretty JSON in the user data dir.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One stored instruction pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstructionEntry {
    /// Human-chosen category name.
    pub name: String,
    /// Generation system instruction template (may use the closed
    /// placeholder set).
    pub instruction: String,
    /// Optional paired judge instruction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_instruction: Option<String>,
}

/// File-backed instruction library.
#[derive(Debug)]
pub struct InstructionLibrary {
    path: PathBuf,
    entries: Vec<InstructionEntry>,
}

impl InstructionLibrary {
    /// Load the library; a missing file is an empty library.
    pub fn load(path: &Path) -> Result<Self> {
        let entries = if path.is_file() {
            let bytes =
                fs::read(path).with_context(|| format!("read library {}", path.display()))?;
            serde_json::from_slice(&bytes).context("parse instruction library JSON")?
        } else {
            Vec::new()
        };
        Ok(InstructionLibrary {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Persist the library in a stable pretty JSON format.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("create library dir")?;
        }
        let text =
            serde_json::to_string_pretty(&self.entries).context("serialize instruction library")?;
        fs::write(&self.path, text.as_bytes())
            .with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }

    /// Names of all stored instruction pairs.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    /// Look up an instruction pair by name.
    pub fn get(&self, name: &str) -> Option<&InstructionEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Create or update an instruction pair. Updates only the supplied
    /// parts when the name already exists.
    pub fn set(
        &mut self,
        name: &str,
        instruction: Option<&str>,
        judge_instruction: Option<&str>,
    ) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.name == name) {
            if let Some(text) = instruction {
                entry.instruction = text.to_string();
            }
            if let Some(text) = judge_instruction {
                entry.judge_instruction = Some(text.to_string());
            }
            return;
        }
        self.entries.push(InstructionEntry {
            name: name.to_string(),
            instruction: instruction.unwrap_or_default().to_string(),
            judge_instruction: judge_instruction.map(|text| text.to_string()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_empty_library() {
        let dir = tempfile::tempdir().expect("tempdir");
        let library =
            InstructionLibrary::load(&dir.path().join("instructions.json")).expect("load");
        assert!(library.names().is_empty());
    }

    #[test]
    fn set_save_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("instructions.json");

        let mut library = InstructionLibrary::load(&path).expect("load");
        library.set("packaging", Some("Enrich {field_to_enrich}."), Some("Be strict."));
        library.save().expect("save");

        let reloaded = InstructionLibrary::load(&path).expect("reload");
        let entry = reloaded.get("packaging").expect("entry");
        assert_eq!(entry.instruction, "Enrich {field_to_enrich}.");
        assert_eq!(entry.judge_instruction.as_deref(), Some("Be strict."));
    }

    #[test]
    fn set_updates_only_supplied_parts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("instructions.json");
        let mut library = InstructionLibrary::load(&path).expect("load");

        library.set("office", Some("v1"), Some("judge v1"));
        library.set("office", Some("v2"), None);

        let entry = library.get("office").expect("entry");
        assert_eq!(entry.instruction, "v2");
        assert_eq!(entry.judge_instruction.as_deref(), Some("judge v1"));
        assert_eq!(library.names(), vec!["office"]);
    }
}
