//! The loaded, read-only index and its query entry points.

use crate::error::{Error, Result};
use crate::index::reader::SectionReader;
use crate::index::types::{BranchId, FileId, NGRAM_SIZE, Ngram, Section};
use crate::query::candidate::CandidateMatch;
use crate::query::doc_iter::{BruteForceIter, DocIterator, NgramDocIter, PatternInfo};
use crate::query::planner::{ContentPlan, MatchGeometry, NgramSelection, plan_content};
use crate::query::substring::Substring;
use crate::utils::{delta_decode, to_lower};
use memchr::memmem;
use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::ops::Range;
use std::sync::Arc;
use tracing::debug;

/// Pattern independent data needed in memory to search.
///
/// Built once by a loader (see [`crate::index::IndexBuilder`]) and read-only
/// afterwards. Iterators returned by [`IndexData::get_doc_iterator`] hold
/// their own decoded postings, but using an index after [`IndexData::close`]
/// is a caller error: reads fail.
pub struct IndexData {
    pub(crate) reader: Box<dyn SectionReader>,

    /// Content ngram -> posting list section
    pub(crate) ngrams: FxHashMap<Ngram, Section>,

    /// Content section of each file
    pub(crate) content_sections: Vec<Section>,
    /// Offsets of file contents in the flattened content. Includes end of last file.
    pub(crate) boundaries: Arc<[u32]>,
    /// `boundaries[1..]`
    pub(crate) file_ends: Arc<[u32]>,

    pub(crate) case_bits: Vec<u8>,
    pub(crate) case_bits_index: Vec<u32>,

    pub(crate) file_name_content: Vec<u8>,
    pub(crate) file_name_case_bits: Vec<u8>,
    pub(crate) file_name_case_bits_index: Vec<u32>,
    /// Delimiters of each file name in `file_name_content`, `files + 1` entries
    pub(crate) file_name_index: Arc<[u32]>,
    /// `file_name_index[1..]`
    pub(crate) file_name_ends: Arc<[u32]>,
    pub(crate) file_name_ngrams: FxHashMap<Ngram, Vec<u32>>,

    pub(crate) file_branch_masks: Vec<u64>,
    pub(crate) branch_names: FxHashMap<BranchId, String>,
    pub(crate) branch_ids: FxHashMap<String, BranchId>,

    pub(crate) repo_name: String,
}

impl IndexData {
    /// Build a candidate iterator for `query`.
    ///
    /// Content patterns shorter than one ngram are rejected with
    /// [`Error::PatternTooShort`]; file name patterns of any length work.
    pub fn get_doc_iterator(&self, query: &Substring) -> Result<DocIterator> {
        if query.file_name {
            return Ok(self.get_file_name_doc_iterator(query));
        }
        if query.pattern.len() < NGRAM_SIZE {
            return Err(Error::PatternTooShort {
                pattern: query.pattern.clone(),
                min: NGRAM_SIZE,
            });
        }

        self.get_content_doc_iterator(query)
    }

    fn get_brute_force_file_name_doc_iterator(&self, query: &Substring) -> DocIterator {
        let lowered = to_lower(query.pattern.as_bytes());
        let needle: &[u8] = if query.case_sensitive {
            query.pattern.as_bytes()
        } else {
            &lowered
        };
        let finder = memmem::Finder::new(needle);

        let mut cands = Vec::new();
        for file in 0..self.num_files() {
            let name = &self.file_name_content[self.file_span_in(&self.file_name_index, file)];
            let found = if query.case_sensitive {
                finder.find(name)
            } else {
                finder.find(&to_lower(name))
            };
            if let Some(idx) = found {
                cands.push((file as FileId, idx as u32));
            }
        }

        let pattern = PatternInfo::new(query, lowered);
        let cands = cands
            .into_iter()
            .map(|(file, offset)| pattern.candidate(file, offset))
            .collect();
        DocIterator::BruteForce(BruteForceIter::new(cands))
    }

    fn get_file_name_doc_iterator(&self, query: &Substring) -> DocIterator {
        let len = query.pattern.len();
        if len < NGRAM_SIZE {
            return self.get_brute_force_file_name_doc_iterator(query);
        }

        let lowered = to_lower(query.pattern.as_bytes());
        let first = Ngram::at(&lowered, 0);
        let last = Ngram::at(&lowered, len - NGRAM_SIZE);
        let lookup = |g: Ngram| self.file_name_ngrams.get(&g).cloned().unwrap_or_default();

        let geometry = MatchGeometry::new(
            NgramSelection {
                first: 0,
                last: len - NGRAM_SIZE,
            },
            len,
        );
        let first_postings = lookup(first);
        let last_postings = (first != last).then(|| lookup(last));

        DocIterator::Ngram(NgramDocIter::new(
            PatternInfo::new(query, lowered),
            geometry,
            Arc::clone(&self.file_name_ends),
            first_postings,
            last_postings,
        ))
    }

    fn get_content_doc_iterator(&self, query: &Substring) -> Result<DocIterator> {
        let lowered = to_lower(query.pattern.as_bytes());
        let plan = plan_content(&lowered, |g| self.posting_frequency(g));

        let (first, last, selection, geometry) = match plan {
            ContentPlan::Impossible { missing_at } => {
                debug!(pattern = %query.pattern, missing_at, "ngram absent from index");
                let geometry = MatchGeometry::new(NgramSelection { first: 0, last: 0 }, lowered.len());
                return Ok(DocIterator::Ngram(NgramDocIter::empty(
                    PatternInfo::new(query, lowered),
                    geometry,
                    Arc::clone(&self.file_ends),
                )));
            }
            ContentPlan::Intersect {
                first,
                last,
                selection,
                geometry,
            } => (first, last, selection, geometry),
        };

        let first_postings = self.read_postings(first)?;
        let last_postings = if selection.first != selection.last {
            Some(self.read_postings(last)?)
        } else {
            None
        };

        debug!(
            pattern = %query.pattern,
            first = selection.first,
            last = selection.last,
            distance = geometry.distance,
            first_postings = first_postings.len(),
            last_postings = last_postings.as_ref().map_or(first_postings.len(), Vec::len),
            covers_content = geometry.covers_content(),
            "planned content search"
        );

        Ok(DocIterator::Ngram(NgramDocIter::new(
            PatternInfo::new(query, lowered),
            geometry,
            Arc::clone(&self.file_ends),
            first_postings,
            last_postings,
        )))
    }

    fn read_postings(&self, ngram: Ngram) -> Result<Vec<u32>> {
        let section = self.ngrams.get(&ngram).copied().unwrap_or_default();
        let blob = self.reader.read_section(section)?;
        Ok(delta_decode(&blob))
    }

    /// Encoded size of the ngram's posting list, 0 when absent.
    pub fn posting_frequency(&self, ngram: Ngram) -> u32 {
        self.ngrams.get(&ngram).map_or(0, |s| s.size)
    }

    fn file_span_in(&self, delimiters: &[u32], file: usize) -> Range<usize> {
        delimiters[file] as usize..delimiters[file + 1] as usize
    }

    /// Name of file `i`.
    ///
    /// # Panics
    ///
    /// If `i >= self.num_files()`.
    pub fn file_name(&self, i: FileId) -> Cow<'_, str> {
        let span = self.file_span_in(&self.file_name_index, i as usize);
        String::from_utf8_lossy(&self.file_name_content[span])
    }

    /// Range of file `i` in the flattened content.
    pub fn file_span(&self, i: FileId) -> Range<usize> {
        self.file_span_in(&self.boundaries, i as usize)
    }

    /// Content of file `i`, read through the index reader.
    pub fn file_content(&self, i: FileId) -> Result<Cow<'_, [u8]>> {
        Ok(self.reader.read_section(self.content_sections[i as usize])?)
    }

    /// Check a candidate against the file name or content it points into.
    pub fn verify(&self, cand: &CandidateMatch) -> Result<bool> {
        if cand.file_name {
            let span = self.file_span_in(&self.file_name_index, cand.file as usize);
            return Ok(cand.matches(&self.file_name_content[span]));
        }
        let content = self.file_content(cand.file)?;
        Ok(cand.matches(&content))
    }

    pub fn num_files(&self) -> usize {
        self.file_name_index.len().saturating_sub(1)
    }

    /// Number of distinct content ngrams
    pub fn ngram_count(&self) -> usize {
        self.ngrams.len()
    }

    pub fn repo_name(&self) -> &str {
        &self.repo_name
    }

    /// Upper-case bitset of file `i`'s content
    pub fn case_bits(&self, i: FileId) -> &[u8] {
        &self.case_bits[self.file_span_in(&self.case_bits_index, i as usize)]
    }

    /// Upper-case bitset of file `i`'s name
    pub fn file_name_case_bits(&self, i: FileId) -> &[u8] {
        &self.file_name_case_bits[self.file_span_in(&self.file_name_case_bits_index, i as usize)]
    }

    /// Bitmask of branches containing file `i`
    pub fn branch_mask(&self, i: FileId) -> u64 {
        self.file_branch_masks[i as usize]
    }

    pub fn branch_name(&self, id: BranchId) -> Option<&str> {
        self.branch_names.get(&id).map(String::as_str)
    }

    pub fn branch_id(&self, name: &str) -> Option<BranchId> {
        self.branch_ids.get(name).copied()
    }

    /// Release the reader. Later reads through this index fail.
    pub fn close(&mut self) -> Result<()> {
        self.reader.close()?;
        Ok(())
    }
}

impl std::fmt::Debug for IndexData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexData")
            .field("repo_name", &self.repo_name)
            .field("files", &self.num_files())
            .field("ngrams", &self.ngrams.len())
            .field("file_name_ngrams", &self.file_name_ngrams.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;
    use std::io;

    /// Serves no sections and refuses to close
    struct StuckReader;

    impl SectionReader for StuckReader {
        fn read_section(&self, _section: Section) -> io::Result<Cow<'_, [u8]>> {
            Ok(Cow::Borrowed(&[]))
        }

        fn close(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "busy"))
        }
    }

    fn index() -> IndexData {
        let mut builder = IndexBuilder::new("unit");
        builder.add_file("a.rs", b"fn main() {}").unwrap();
        builder.finish().unwrap()
    }

    #[test]
    fn test_index_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IndexData>();
    }

    #[test]
    fn test_close_propagates_reader_error() {
        let mut index = index();
        index.reader = Box::new(StuckReader);
        match index.close() {
            Err(Error::ReaderFailure(err)) => {
                assert_eq!(err.kind(), io::ErrorKind::PermissionDenied)
            }
            other => panic!("expected ReaderFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_close_then_content_read_fails() {
        let mut index = index();
        index.close().unwrap();
        assert!(matches!(index.file_content(0), Err(Error::ReaderFailure(_))));
    }
}
