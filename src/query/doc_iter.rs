//! Candidate match producers.
//!
//! A [`DocIterator`] is single pass: once `next_batch` returns an empty
//! batch it stays exhausted. Iterators own their posting lists and never
//! touch the index reader after construction.

use crate::index::types::FileId;
use crate::query::candidate::CandidateMatch;
use crate::query::planner::MatchGeometry;
use crate::query::substring::Substring;
use std::sync::Arc;

/// Candidate producer for one substring query
#[derive(Debug)]
pub enum DocIterator {
    BruteForce(BruteForceIter),
    Ngram(NgramDocIter),
}

impl DocIterator {
    /// The next batch of candidates, empty once the iterator is exhausted.
    pub fn next_batch(&mut self) -> Vec<CandidateMatch> {
        match self {
            DocIterator::BruteForce(it) => it.next_batch(),
            DocIterator::Ngram(it) => it.next_batch(),
        }
    }

    /// Whether the selected ngrams span the whole pattern.
    ///
    /// For ngram iterators this is purely geometric and certifies a
    /// case-insensitive match only: the index is case folded. Use
    /// [`DocIterator::needs_verification`] to decide whether candidates
    /// must be checked against the file bytes.
    pub fn covers_content(&self) -> bool {
        match self {
            DocIterator::BruteForce(_) => true,
            DocIterator::Ngram(it) => it.covers_content(),
        }
    }

    /// Whether candidates may be false positives for this query.
    ///
    /// Brute force candidates are exact. Ngram candidates need a check when
    /// the ngrams leave part of the pattern uncovered or the query is case
    /// sensitive.
    pub fn needs_verification(&self) -> bool {
        match self {
            DocIterator::BruteForce(_) => false,
            DocIterator::Ngram(it) => !it.covers_content() || it.case_sensitive(),
        }
    }

    /// Drain every remaining batch into one vector.
    pub fn collect_candidates(&mut self) -> Vec<CandidateMatch> {
        self.flatten().collect()
    }
}

impl Iterator for DocIterator {
    type Item = Vec<CandidateMatch>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch = self.next_batch();
        (!batch.is_empty()).then_some(batch)
    }
}

/// Pre-computed candidates, handed out in a single batch.
#[derive(Debug, Default)]
pub struct BruteForceIter {
    cands: Vec<CandidateMatch>,
}

impl BruteForceIter {
    pub fn new(cands: Vec<CandidateMatch>) -> Self {
        Self { cands }
    }

    fn next_batch(&mut self) -> Vec<CandidateMatch> {
        std::mem::take(&mut self.cands)
    }
}

/// Pattern fields copied into every candidate
#[derive(Debug, Clone)]
pub(crate) struct PatternInfo {
    pub case_sensitive: bool,
    pub file_name: bool,
    pub substr_bytes: Arc<[u8]>,
    pub substr_lowered: Arc<[u8]>,
}

impl PatternInfo {
    pub fn new(query: &Substring, lowered: Vec<u8>) -> Self {
        Self {
            case_sensitive: query.case_sensitive,
            file_name: query.file_name,
            substr_bytes: Arc::from(query.pattern.as_bytes()),
            substr_lowered: Arc::from(lowered),
        }
    }

    pub fn candidate(&self, file: FileId, offset: u32) -> CandidateMatch {
        CandidateMatch {
            case_sensitive: self.case_sensitive,
            file_name: self.file_name,
            substr_bytes: Arc::clone(&self.substr_bytes),
            substr_lowered: Arc::clone(&self.substr_lowered),
            file,
            offset,
            match_len: self.substr_lowered.len() as u32,
        }
    }
}

/// Intersects the posting lists of two ngrams of the pattern.
///
/// A position `a` in `first` and `b` in `last` with `b - a == distance`
/// puts the pattern at `a - left_pad`. Absolute offsets are mapped to a
/// file through `ends`, the ascending end offsets of each file.
#[derive(Debug)]
pub struct NgramDocIter {
    pattern: PatternInfo,
    geometry: MatchGeometry,
    covers_content: bool,
    ends: Arc<[u32]>,
    first: Vec<u32>,
    /// `None` when both selected ngrams are the same one
    last: Option<Vec<u32>>,
    i: usize,
    j: usize,
    pending: Option<CandidateMatch>,
}

impl NgramDocIter {
    pub(crate) fn new(
        pattern: PatternInfo,
        geometry: MatchGeometry,
        ends: Arc<[u32]>,
        first: Vec<u32>,
        last: Option<Vec<u32>>,
    ) -> Self {
        Self {
            pattern,
            covers_content: geometry.covers_content(),
            geometry,
            ends,
            first,
            last,
            i: 0,
            j: 0,
            pending: None,
        }
    }

    /// An iterator that produces nothing, for patterns that cannot occur.
    /// Its `covers_content` is always false.
    pub(crate) fn empty(pattern: PatternInfo, geometry: MatchGeometry, ends: Arc<[u32]>) -> Self {
        Self {
            covers_content: false,
            ..Self::new(pattern, geometry, ends, Vec::new(), None)
        }
    }

    pub fn covers_content(&self) -> bool {
        self.covers_content
    }

    pub fn case_sensitive(&self) -> bool {
        self.pattern.case_sensitive
    }

    pub fn geometry(&self) -> MatchGeometry {
        self.geometry
    }

    fn last(&self) -> &[u32] {
        self.last.as_deref().unwrap_or(&self.first)
    }

    /// Advance the merge to the next pattern start that fits in one file.
    fn advance(&mut self) -> Option<CandidateMatch> {
        if let Some(cand) = self.pending.take() {
            return Some(cand);
        }

        let distance = self.geometry.distance as u64;
        while self.i < self.first.len() && self.j < self.last().len() {
            let a = self.first[self.i] as u64;
            let b = self.last()[self.j] as u64;
            let target = a + distance;

            if b < target {
                self.j += 1;
                continue;
            }
            self.i += 1;
            if b > target {
                continue;
            }
            self.j += 1;

            if let Some(cand) = self.locate(a) {
                return Some(cand);
            }
        }
        None
    }

    /// Map the posting position of the first ngram to a candidate, or
    /// `None` when the pattern would start before or run past its file.
    fn locate(&self, first_pos: u64) -> Option<CandidateMatch> {
        let start = first_pos.checked_sub(self.geometry.left_pad as u64)?;
        let file = self.ends.partition_point(|&end| (end as u64) <= start);
        let end = *self.ends.get(file)? as u64;
        let file_start = if file == 0 {
            0
        } else {
            self.ends[file - 1] as u64
        };

        if start + self.geometry.pattern_len as u64 > end {
            return None;
        }
        Some(
            self.pattern
                .candidate(file as FileId, (start - file_start) as u32),
        )
    }

    /// All candidates of the next file that has any.
    fn next_batch(&mut self) -> Vec<CandidateMatch> {
        let mut batch: Vec<CandidateMatch> = Vec::new();
        while let Some(cand) = self.advance() {
            if let Some(head) = batch.first() {
                if head.file != cand.file {
                    self.pending = Some(cand);
                    break;
                }
            }
            batch.push(cand);
        }
        batch
    }
}
