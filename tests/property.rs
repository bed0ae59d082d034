//! Property tests for posting encoding, selectivity planning and
//! candidate generation.

use gramdex::index::{IndexBuilder, IndexData, NGRAM_SIZE};
use gramdex::query::{MatchGeometry, Substring, select_rarest_pair};
use gramdex::utils::{delta_decode, delta_encode};
use proptest::prelude::*;
use std::collections::BTreeSet;

// ============================================================================
// STRATEGIES
// ============================================================================

/// Ascending, duplicate-free posting offsets
fn postings_strategy() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::btree_set(any::<u32>(), 0..200).prop_map(|s| s.into_iter().collect())
}

/// Small alphabet so ngrams repeat and patterns actually occur
fn corpus_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[abcAB]{0,40}", 1..6)
}

fn build(files: &[String]) -> IndexData {
    let mut builder = IndexBuilder::new("prop");
    for (i, content) in files.iter().enumerate() {
        let stem = content.get(..4).unwrap_or(content.as_str());
        builder
            .add_file(&format!("f{}_{}", i, stem), content.as_bytes())
            .unwrap();
    }
    builder.finish().unwrap()
}

fn naive(index: &IndexData, pattern: &str) -> BTreeSet<(u32, u32)> {
    let needle = pattern.to_ascii_lowercase().into_bytes();
    let mut found = BTreeSet::new();
    for file in 0..index.num_files() as u32 {
        let content = index.file_content(file).unwrap().to_ascii_lowercase();
        for i in 0..content.len().saturating_sub(needle.len() - 1) {
            if content[i..].starts_with(&needle) {
                found.insert((file, i as u32));
            }
        }
    }
    found
}

// ============================================================================
// ENCODING
// ============================================================================

proptest! {
    #[test]
    fn prop_delta_roundtrip(values in postings_strategy()) {
        let mut buf = Vec::new();
        delta_encode(&values, &mut buf);
        prop_assert_eq!(delta_decode(&buf), values);
    }
}

// ============================================================================
// SELECTIVITY
// ============================================================================

proptest! {
    #[test]
    fn prop_selection_picks_leftmost_minima(freqs in prop::collection::vec(1u32..6, 1..20)) {
        let sel = select_rarest_pair(&freqs).unwrap();
        prop_assert!(sel.first <= sel.last);

        let min = *freqs.iter().min().unwrap();
        let leftmost = freqs.iter().position(|&f| f == min).unwrap();
        prop_assert!(sel.first == leftmost || sel.last == leftmost);

        let rarest = leftmost;
        let runner_up = if freqs.len() == 1 {
            rarest
        } else {
            let rest_min = freqs
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != rarest)
                .map(|(_, &f)| f)
                .min()
                .unwrap();
            freqs
                .iter()
                .enumerate()
                .position(|(i, &f)| i != rarest && f == rest_min)
                .unwrap()
        };
        prop_assert_eq!((sel.first, sel.last), (rarest.min(runner_up), rarest.max(runner_up)));
    }

    #[test]
    fn prop_geometry_tiles_pattern(len in NGRAM_SIZE..40usize, a in 0usize..40, b in 0usize..40) {
        let positions = len - NGRAM_SIZE + 1;
        let (a, b) = (a % positions, b % positions);
        let sel = gramdex::query::NgramSelection { first: a.min(b), last: a.max(b) };
        let geo = MatchGeometry::new(sel, len);

        prop_assert_eq!(
            (geo.left_pad + geo.distance + NGRAM_SIZE as u32 + geo.right_pad) as usize,
            len
        );
        prop_assert_eq!(
            geo.covers_content(),
            geo.distance as usize <= NGRAM_SIZE && geo.left_pad == 0 && geo.right_pad == 0
        );
    }
}

// ============================================================================
// CANDIDATES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_content_search_has_no_false_negatives(
        files in corpus_strategy(),
        pattern in "[abcAB]{3,7}",
    ) {
        let index = build(&files);
        let mut iter = index.get_doc_iterator(&Substring::new(pattern.clone())).unwrap();
        let check = iter.needs_verification();
        let cands = iter.collect_candidates();

        let mut verified = BTreeSet::new();
        for cand in &cands {
            let ok = index.verify(cand).unwrap();
            if !check {
                prop_assert!(ok, "unchecked candidate failed verification: {:?}", cand);
            }
            let span = index.file_span(cand.file);
            prop_assert!(cand.offset as usize + cand.match_len as usize <= span.len());
            if ok {
                verified.insert((cand.file, cand.offset));
            }
        }
        prop_assert_eq!(verified, naive(&index, &pattern));
    }

    #[test]
    fn prop_file_name_search_has_no_false_negatives(
        files in corpus_strategy(),
        pattern in "[abcAB_0-9]{1,6}",
    ) {
        let index = build(&files);
        let mut iter = index.get_doc_iterator(&Substring::file_name(pattern.clone())).unwrap();
        let check = iter.needs_verification();

        let lowered = pattern.to_ascii_lowercase();
        let mut verified = BTreeSet::new();
        for cand in iter.collect_candidates() {
            let ok = index.verify(&cand).unwrap();
            prop_assert!(check || ok);
            if ok {
                verified.insert(cand.file);
            }
        }

        let expected: BTreeSet<u32> = (0..index.num_files() as u32)
            .filter(|&i| index.file_name(i).to_ascii_lowercase().contains(&lowered))
            .collect();
        prop_assert_eq!(verified, expected);
    }
}
