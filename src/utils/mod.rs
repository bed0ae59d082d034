//! Utility functions shared by the index and the query planner.
//!
//! ## Modules
//!
//! - [`encoding`] - Varint and delta encoding of posting lists
//! - [`ngram`] - Case folding, case bits and ngram extraction
//!
//! ```
//! use gramdex::utils::{delta_decode, delta_encode, to_lower};
//!
//! let mut buf = Vec::new();
//! delta_encode(&[3, 9, 40], &mut buf);
//! assert_eq!(delta_decode(&buf), vec![3, 9, 40]);
//!
//! assert_eq!(to_lower(b"Main.RS"), b"main.rs");
//! ```

pub mod encoding;
pub mod ngram;

pub use encoding::*;
pub use ngram::*;
