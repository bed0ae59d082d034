//! # gramdex - trigram index query core
//!
//! Given a loaded, read-only trigram index and a substring query, gramdex
//! decides how to search (brute-force scan of file names, or intersection of
//! ngram posting lists), picks the rarest ngrams of the pattern and produces a
//! stream of candidate match locations for downstream verification.
//!
//! ## Architecture
//!
//! - [`index`] - The in-memory index, its section reader and loaders
//! - [`query`] - Substring queries, selectivity planning, doc iterators
//! - [`utils`] - Posting list encoding and case folding
//!
//! ## Quick Start
//!
//! ```
//! use gramdex::index::IndexBuilder;
//! use gramdex::query::Substring;
//!
//! let mut builder = IndexBuilder::new("demo");
//! builder.add_file("main.rs", b"fn main() { run(); }").unwrap();
//! builder.add_file("lib.rs", b"pub fn run() {}").unwrap();
//! let index = builder.finish().unwrap();
//!
//! let mut iter = index.get_doc_iterator(&Substring::new("run()")).unwrap();
//! let check = iter.needs_verification();
//! for cand in iter.collect_candidates() {
//!     if !check || index.verify(&cand).unwrap() {
//!         println!("{}:{}", index.file_name(cand.file), cand.offset);
//!     }
//! }
//! ```
//!
//! ## How candidates are found
//!
//! A pattern of `n` bytes holds `n - 2` overlapping trigrams. The two rarest
//! are intersected: a posting pair at exactly the distance the trigrams have
//! inside the pattern marks a candidate start. When the two trigrams cover the
//! whole pattern, candidates are exact (case-insensitively) and
//! `covers_content()` is true. `needs_verification()` also accounts for
//! case-sensitive queries, whose candidates are always checked against the
//! file bytes.

pub mod error;
pub mod index;
pub mod query;
pub mod utils;

pub use error::{Error, Result};
pub use index::{IndexBuilder, IndexData};
pub use query::{CandidateMatch, DocIterator, Substring};
