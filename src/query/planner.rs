//! Ngram selectivity planning for content queries.
//!
//! A pattern of length `len` decomposes into `len - NGRAM_SIZE + 1`
//! overlapping ngrams. The planner picks the two rarest ones and records
//! where they sit inside the pattern, so that a pair of postings at the
//! right distance can be turned back into a pattern start offset.

use crate::index::types::{NGRAM_SIZE, Ngram};

/// The two ngram positions chosen for intersection, `first <= last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NgramSelection {
    pub first: usize,
    pub last: usize,
}

/// Placement of the selected ngrams inside the pattern.
///
/// `left_pad + distance + NGRAM_SIZE + right_pad == pattern_len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchGeometry {
    /// Gap between the starts of the first and last ngram
    pub distance: u32,
    /// Pattern bytes before the first ngram
    pub left_pad: u32,
    /// Pattern bytes after the start of the last ngram, minus one ngram
    pub right_pad: u32,
    pub pattern_len: u32,
}

impl MatchGeometry {
    pub fn new(selection: NgramSelection, pattern_len: usize) -> Self {
        debug_assert!(selection.first <= selection.last);
        debug_assert!(selection.last + NGRAM_SIZE <= pattern_len);
        Self {
            distance: (selection.last - selection.first) as u32,
            left_pad: selection.first as u32,
            right_pad: (pattern_len - NGRAM_SIZE - selection.last) as u32,
            pattern_len: pattern_len as u32,
        }
    }

    /// True when the two ngrams together span the whole pattern, so a
    /// matching posting pair is a match without looking at the content.
    pub fn covers_content(&self) -> bool {
        self.distance as usize <= NGRAM_SIZE && self.left_pad == 0 && self.right_pad == 0
    }
}

/// Outcome of planning a content query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPlan {
    /// The ngram at this pattern position never occurs, so neither does the pattern.
    Impossible { missing_at: usize },
    Intersect {
        first: Ngram,
        last: Ngram,
        selection: NgramSelection,
        geometry: MatchGeometry,
    },
}

/// Index of the smallest value, leftmost on ties. `None` when every
/// position is excluded.
fn min_arg(frequencies: &[u32], exclude: Option<usize>) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (i, &f) in frequencies.iter().enumerate() {
        if Some(i) == exclude {
            continue;
        }
        // Strict comparison keeps the leftmost minimum
        if best.is_none_or(|(_, m)| f < m) {
            best = Some((i, f));
        }
    }
    best.map(|(i, _)| i)
}

/// Pick the two least frequent positions.
///
/// Leftmost wins on equal frequency. With a single position both picks are
/// the same ngram. Returns `None` for an empty slice.
pub fn select_rarest_pair(frequencies: &[u32]) -> Option<NgramSelection> {
    let a = min_arg(frequencies, None)?;
    let b = min_arg(frequencies, Some(a)).unwrap_or(a);
    Some(NgramSelection {
        first: a.min(b),
        last: a.max(b),
    })
}

/// Plan a content query over an already lower-cased pattern.
///
/// `frequency` returns 0 for ngrams absent from the index. The pattern must
/// hold at least one ngram.
pub fn plan_content<F>(lowered: &[u8], frequency: F) -> ContentPlan
where
    F: Fn(Ngram) -> u32,
{
    debug_assert!(lowered.len() >= NGRAM_SIZE);
    let count = lowered.len() + 1 - NGRAM_SIZE;

    let mut frequencies = Vec::with_capacity(count);
    for pos in 0..count {
        let f = frequency(Ngram::at(lowered, pos));
        if f == 0 {
            return ContentPlan::Impossible { missing_at: pos };
        }
        frequencies.push(f);
    }

    let selection = match select_rarest_pair(&frequencies) {
        Some(selection) => selection,
        None => return ContentPlan::Impossible { missing_at: 0 },
    };

    ContentPlan::Intersect {
        first: Ngram::at(lowered, selection.first),
        last: Ngram::at(lowered, selection.last),
        selection,
        geometry: MatchGeometry::new(selection, lowered.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_select_leftmost_on_ties() {
        let sel = select_rarest_pair(&[5, 2, 7, 2, 2]).unwrap();
        assert_eq!(sel, NgramSelection { first: 1, last: 3 });
    }

    #[test]
    fn test_select_swaps_into_order() {
        // Rarest is on the right, runner-up on the left
        let sel = select_rarest_pair(&[3, 9, 9, 1]).unwrap();
        assert_eq!(sel, NgramSelection { first: 0, last: 3 });
    }

    #[test]
    fn test_select_single_and_empty() {
        assert_eq!(
            select_rarest_pair(&[4]),
            Some(NgramSelection { first: 0, last: 0 })
        );
        assert_eq!(select_rarest_pair(&[]), None);
    }

    #[test]
    fn test_geometry_tiles_pattern() {
        let geo = MatchGeometry::new(NgramSelection { first: 2, last: 5 }, 10);
        assert_eq!(geo.distance, 3);
        assert_eq!(geo.left_pad, 2);
        assert_eq!(geo.right_pad, 2);
        assert_eq!(
            geo.left_pad + geo.distance + NGRAM_SIZE as u32 + geo.right_pad,
            geo.pattern_len
        );
        assert!(!geo.covers_content());
    }

    #[test]
    fn test_covers_content() {
        // Single ngram pattern
        assert!(MatchGeometry::new(NgramSelection { first: 0, last: 0 }, 3).covers_content());
        // First and last ngram of a six byte pattern meet exactly
        assert!(MatchGeometry::new(NgramSelection { first: 0, last: 3 }, 6).covers_content());
        // Gap between them
        assert!(!MatchGeometry::new(NgramSelection { first: 0, last: 4 }, 7).covers_content());
        // Trailing slack
        assert!(!MatchGeometry::new(NgramSelection { first: 0, last: 1 }, 5).covers_content());
    }

    #[test]
    fn test_plan_content_missing_ngram() {
        let plan = plan_content(b"abcd", |g| if g == Ngram::from_bytes(b"bcd") { 0 } else { 4 });
        assert_eq!(plan, ContentPlan::Impossible { missing_at: 1 });
    }

    #[test]
    fn test_plan_content_picks_rarest() {
        let freq: HashMap<Ngram, u32> = [
            (Ngram::from_bytes(b"hel"), 10),
            (Ngram::from_bytes(b"ell"), 3),
            (Ngram::from_bytes(b"llo"), 8),
            (Ngram::from_bytes(b"lo!"), 1),
        ]
        .into_iter()
        .collect();
        let plan = plan_content(b"hello!", |g| freq.get(&g).copied().unwrap_or(0));
        match plan {
            ContentPlan::Intersect {
                first,
                last,
                selection,
                geometry,
            } => {
                assert_eq!(selection, NgramSelection { first: 1, last: 3 });
                assert_eq!(first, Ngram::from_bytes(b"ell"));
                assert_eq!(last, Ngram::from_bytes(b"lo!"));
                assert_eq!(geometry.distance, 2);
                assert_eq!(geometry.left_pad, 1);
                assert_eq!(geometry.right_pad, 0);
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }
}
