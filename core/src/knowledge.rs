use crate::dialog::{Question, ScriptedResponse};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One canned answer the fallback matcher can pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    #[serde(default)]
    pub id: Option<String>,
    /// Phrasing matched against user messages. Falls back to `response` when absent.
    #[serde(default)]
    pub query: Option<String>,
    pub response: String,
}

impl KnowledgeEntry {
    pub fn new(response: impl Into<String>) -> Self {
        Self { id: None, query: None, response: response.into() }
    }

    pub fn with_query(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self { id: None, query: Some(query.into()), response: response.into() }
    }

    /// Text that gets indexed for this entry.
    pub fn indexed_text(&self) -> &str {
        self.query.as_deref().unwrap_or(&self.response)
    }
}

/// Static widget configuration: the scripted dialog plus the fallback knowledge base.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatData {
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub responses: Vec<ScriptedResponse>,
    #[serde(default)]
    pub knowledge: Vec<KnowledgeEntry>,
}

impl ChatData {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let data: ChatData = serde_json::from_str(s)?;
        Ok(data)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let f = File::open(path).with_context(|| format!("opening chat data {}", path.display()))?;
        let data: ChatData = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parsing chat data {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            questions = data.questions.len(),
            responses = data.responses.len(),
            knowledge = data.knowledge.len(),
            "loaded chat data"
        );
        Ok(data)
    }
}

/// Load knowledge entries from a file or a directory of `.json`/`.jsonl` files.
///
/// Directory entries are visited in file-name order so document positions, and
/// therefore tie-breaks, are stable across runs. A `.json` file may hold a full
/// [`ChatData`] object, a bare array of entries, or a single entry.
pub fn load_knowledge(input: &Path) -> Result<Vec<KnowledgeEntry>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("knowledge input {} does not exist", input.display());
    }

    let mut entries = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            load_jsonl(&file, &mut entries)?;
        } else {
            load_json(&file, &mut entries)?;
        }
    }
    tracing::info!(input = %input.display(), entries = entries.len(), "loaded knowledge base");
    Ok(entries)
}

fn load_jsonl(file: &Path, entries: &mut Vec<KnowledgeEntry>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let entry: KnowledgeEntry = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid knowledge entry", file.display(), lineno + 1))?;
        entries.push(entry);
    }
    Ok(())
}

fn load_json(file: &Path, entries: &mut Vec<KnowledgeEntry>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let json: serde_json::Value = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                entries.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(obj) if obj.contains_key("response") => {
            entries.push(serde_json::from_value(serde_json::Value::Object(obj))?);
        }
        serde_json::Value::Object(obj) => {
            let data: ChatData = serde_json::from_value(serde_json::Value::Object(obj))?;
            entries.extend(data.knowledge);
        }
        _ => tracing::warn!(file = %file.display(), "ignoring non-object knowledge file"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_text_prefers_query() {
        assert_eq!(KnowledgeEntry::with_query("hours?", "9 to 5").indexed_text(), "hours?");
        assert_eq!(KnowledgeEntry::new("9 to 5").indexed_text(), "9 to 5");
    }

    #[test]
    fn chat_data_defaults_missing_sections() {
        let data = ChatData::from_json_str(r#"{"knowledge":[{"response":"hi"}]}"#).unwrap();
        assert!(data.questions.is_empty());
        assert_eq!(data.knowledge, vec![KnowledgeEntry::new("hi")]);
    }
}
