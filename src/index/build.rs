//! In-memory index loading.
//!
//! [`IndexBuilder`] assembles the data model the query core reads from:
//! flattened file contents, delta-compressed content postings, eagerly
//! decoded file name postings and the per-file metadata tables.

use crate::index::data::IndexData;
use crate::index::reader::{BlobReader, MmapReader};
use crate::index::types::{BranchId, BuildConfig, FileId, Ngram, Section};
use crate::utils::{case_bits, delta_encode, is_binary, ngrams_with_positions, to_lower};
use anyhow::{Context, Result, bail};
use ignore::WalkBuilder;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Branch masks are u64 bitsets
const MAX_BRANCHES: usize = 64;

/// Accumulates files and produces an [`IndexData`].
///
/// Ngrams are extracted per file, so no ngram spans two files.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    repo_name: String,

    content: Vec<u8>,
    boundaries: Vec<u32>,
    postings: BTreeMap<Ngram, Vec<u32>>,
    case_bits: Vec<u8>,
    case_bits_index: Vec<u32>,

    file_name_content: Vec<u8>,
    file_name_index: Vec<u32>,
    file_name_postings: BTreeMap<Ngram, Vec<u32>>,
    file_name_case_bits: Vec<u8>,
    file_name_case_bits_index: Vec<u32>,

    branch_masks: Vec<u64>,
    branch_ids: FxHashMap<String, BranchId>,
}

fn to_offset(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).with_context(|| format!("{} exceeds 4GiB", what))
}

impl IndexBuilder {
    pub fn new(repo_name: impl Into<String>) -> Self {
        Self {
            repo_name: repo_name.into(),
            boundaries: vec![0],
            case_bits_index: vec![0],
            file_name_index: vec![0],
            file_name_case_bits_index: vec![0],
            ..Default::default()
        }
    }

    pub fn num_files(&self) -> usize {
        self.branch_masks.len()
    }

    /// Add a file on no branch.
    pub fn add_file(&mut self, name: &str, content: &[u8]) -> Result<FileId> {
        self.add_file_with_branches(name, content, &[])
    }

    /// Add a file present on the given branches.
    pub fn add_file_with_branches(
        &mut self,
        name: &str,
        content: &[u8],
        branches: &[&str],
    ) -> Result<FileId> {
        let file = to_offset(self.num_files(), "file count")?;
        let mut mask = 0u64;
        for branch in branches {
            mask |= 1u64 << self.branch_id(branch)?;
        }

        let start = self.content.len();
        let end = to_offset(start + content.len(), "content")?;
        let name_start = self.file_name_content.len();
        let name_end = to_offset(name_start + name.len(), "file names")?;

        for (gram, pos) in ngrams_with_positions(&to_lower(content)) {
            self.postings.entry(gram).or_default().push((start + pos) as u32);
        }
        for (gram, pos) in ngrams_with_positions(&to_lower(name.as_bytes())) {
            self.file_name_postings
                .entry(gram)
                .or_default()
                .push((name_start + pos) as u32);
        }

        self.content.extend_from_slice(content);
        self.boundaries.push(end);
        self.case_bits.extend(case_bits(content));
        self.case_bits_index
            .push(to_offset(self.case_bits.len(), "case bits")?);

        self.file_name_content.extend_from_slice(name.as_bytes());
        self.file_name_index.push(name_end);
        self.file_name_case_bits.extend(case_bits(name.as_bytes()));
        self.file_name_case_bits_index
            .push(to_offset(self.file_name_case_bits.len(), "case bits")?);

        self.branch_masks.push(mask);
        Ok(file)
    }

    fn branch_id(&mut self, name: &str) -> Result<BranchId> {
        if let Some(&id) = self.branch_ids.get(name) {
            return Ok(id);
        }
        if self.branch_ids.len() >= MAX_BRANCHES {
            bail!("more than {} branches", MAX_BRANCHES);
        }
        let id = self.branch_ids.len() as BranchId;
        self.branch_ids.insert(name.to_string(), id);
        Ok(id)
    }

    /// Lay out contents followed by the encoded postings. The returned index
    /// still needs a reader over the blob.
    fn assemble(self) -> Result<(Vec<u8>, IndexData)> {
        let file_count = self.num_files();
        let mut blob = self.content;

        let content_sections = self
            .boundaries
            .windows(2)
            .map(|w| Section::new(w[0], w[1] - w[0]))
            .collect();

        let mut ngrams = FxHashMap::default();
        ngrams.reserve(self.postings.len());
        let mut buf = Vec::new();
        for (gram, offsets) in &self.postings {
            buf.clear();
            delta_encode(offsets, &mut buf);
            let offset = to_offset(blob.len(), "posting blob")?;
            let size = to_offset(buf.len(), "posting list")?;
            blob.extend_from_slice(&buf);
            ngrams.insert(*gram, Section::new(offset, size));
        }

        let boundaries: Arc<[u32]> = Arc::from(self.boundaries);
        let file_ends: Arc<[u32]> = Arc::from(&boundaries[1..]);
        let file_name_index: Arc<[u32]> = Arc::from(self.file_name_index);
        let file_name_ends: Arc<[u32]> = Arc::from(&file_name_index[1..]);
        let branch_names = self
            .branch_ids
            .iter()
            .map(|(name, &id)| (id, name.clone()))
            .collect();

        debug!(
            files = file_count,
            ngrams = ngrams.len(),
            blob_bytes = blob.len(),
            "assembled index"
        );

        let data = IndexData {
            reader: Box::new(BlobReader::default()),
            ngrams,
            content_sections,
            boundaries,
            file_ends,
            case_bits: self.case_bits,
            case_bits_index: self.case_bits_index,
            file_name_content: self.file_name_content,
            file_name_case_bits: self.file_name_case_bits,
            file_name_case_bits_index: self.file_name_case_bits_index,
            file_name_index,
            file_name_ends,
            file_name_ngrams: self.file_name_postings.into_iter().collect(),
            file_branch_masks: self.branch_masks,
            branch_names,
            branch_ids: self.branch_ids,
            repo_name: self.repo_name,
        };
        Ok((blob, data))
    }

    /// Finish with the blob held in memory.
    pub fn finish(self) -> Result<IndexData> {
        let (blob, mut data) = self.assemble()?;
        data.reader = Box::new(BlobReader::new(blob));
        Ok(data)
    }

    /// Finish by writing the blob to `path` and memory-mapping it.
    pub fn finish_mmap(self, path: &Path) -> Result<IndexData> {
        let (blob, mut data) = self.assemble()?;
        fs::write(path, &blob).with_context(|| format!("Failed to write {}", path.display()))?;
        let reader = MmapReader::open(path)
            .with_context(|| format!("Failed to map {}", path.display()))?;
        data.reader = Box::new(reader);
        Ok(data)
    }
}

/// Load every eligible file under `root` into an in-memory index.
///
/// Respects gitignore rules, skips hidden entries, `config.ignored_paths`,
/// files over `config.max_file_size` and (optionally) binary files. Files
/// are added in path order, so file ids are stable across runs.
pub fn build_from_dir(root: &Path, config: &BuildConfig) -> Result<IndexData> {
    let root = root.canonicalize().context("Invalid path")?;
    let ignored = config.ignored_paths.clone();

    let walker = WalkBuilder::new(&root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .filter_entry(move |entry| {
            if !entry.file_type().is_some_and(|t| t.is_dir()) {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !ignored.iter().any(|i| i == name.as_ref())
        })
        .build();

    let mut paths: Vec<PathBuf> = walker
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .filter(|entry| {
            entry
                .metadata()
                .map(|m| m.len() <= config.max_file_size)
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();

    let files: Vec<(String, Vec<u8>)> = paths
        .par_iter()
        .filter_map(|path| {
            let content = fs::read(path).ok()?;
            if config.skip_binary && is_binary(&content) {
                return None;
            }
            let rel = path.strip_prefix(&root).unwrap_or(path);
            let name = rel.to_string_lossy().replace('\\', "/");
            Some((name, content))
        })
        .collect();

    let repo_name = if config.repo_name.is_empty() {
        root.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        config.repo_name.clone()
    };

    let mut builder = IndexBuilder::new(repo_name);
    let mut total_bytes = 0usize;
    for (name, content) in &files {
        total_bytes += content.len();
        builder
            .add_file(name, content)
            .with_context(|| format!("Failed to index {}", name))?;
    }

    info!(
        root = %root.display(),
        files = files.len(),
        skipped = paths.len() - files.len(),
        bytes = total_bytes,
        "loaded directory"
    );
    builder.finish()
}
