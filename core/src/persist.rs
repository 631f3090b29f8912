use crate::knowledge::KnowledgeEntry;
use crate::TfIdfIndex;
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: usize,
    pub created_at: String,
    pub version: u32,
}

/// Layout of a snapshot directory.
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn index(&self) -> PathBuf { self.root.join("index.bin") }
    fn knowledge(&self) -> PathBuf { self.root.join("knowledge.json") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

pub fn save_index(paths: &IndexPaths, index: &TfIdfIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.index())?;
    let bytes = bincode::serialize(index)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_index(paths: &IndexPaths) -> Result<TfIdfIndex> {
    let mut f = File::open(paths.index()).with_context(|| format!("opening {}", paths.index().display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let index: TfIdfIndex = bincode::deserialize(&buf)?;
    ensure!(index.check_invariants(), "index snapshot {} is inconsistent", paths.index().display());
    Ok(index)
}

pub fn save_knowledge(paths: &IndexPaths, entries: &[KnowledgeEntry]) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.knowledge())?;
    let json = serde_json::to_string_pretty(entries)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_knowledge_snapshot(paths: &IndexPaths) -> Result<Vec<KnowledgeEntry>> {
    let mut f = File::open(paths.knowledge()).with_context(|| format!("opening {}", paths.knowledge().display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let entries: Vec<KnowledgeEntry> = serde_json::from_str(&buf)?;
    Ok(entries)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta()).with_context(|| format!("opening {}", paths.meta().display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Write index, knowledge base and meta.json into `paths.root`.
pub fn save_snapshot(paths: &IndexPaths, entries: &[KnowledgeEntry], index: &TfIdfIndex) -> Result<MetaFile> {
    save_index(paths, index)?;
    save_knowledge(paths, entries)?;
    let meta = MetaFile {
        num_docs: index.num_docs(),
        num_terms: index.num_terms(),
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)?,
        version: SNAPSHOT_VERSION,
    };
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, num_terms = meta.num_terms, "saved snapshot");
    Ok(meta)
}

/// Load a snapshot written by [`save_snapshot`], checking it against its meta.json.
pub fn load_snapshot(paths: &IndexPaths) -> Result<(Vec<KnowledgeEntry>, TfIdfIndex, MetaFile)> {
    let meta = load_meta(paths)?;
    ensure!(meta.version == SNAPSHOT_VERSION, "unsupported snapshot version {}", meta.version);
    let index = load_index(paths)?;
    let entries = load_knowledge_snapshot(paths)?;
    ensure!(
        meta.num_docs == index.num_docs() && entries.len() == index.num_docs() as usize,
        "snapshot mismatch: meta has {} docs, index {}, knowledge {}",
        meta.num_docs,
        index.num_docs(),
        entries.len()
    );
    Ok((entries, index, meta))
}
