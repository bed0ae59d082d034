use crate::index::types::FileId;
use crate::utils::to_lower;
use serde::Serialize;
use std::sync::Arc;

/// A possible occurrence of a substring query.
///
/// Candidates from an iterator whose `covers_content()` is false are
/// unverified and must be checked against the file bytes, e.g. with
/// [`CandidateMatch::matches`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateMatch {
    pub case_sensitive: bool,
    pub file_name: bool,
    /// Pattern as given in the query
    #[serde(serialize_with = "serialize_bytes_lossy")]
    pub substr_bytes: Arc<[u8]>,
    /// Lower-cased pattern
    #[serde(serialize_with = "serialize_bytes_lossy")]
    pub substr_lowered: Arc<[u8]>,
    pub file: FileId,
    /// Byte offset within the file content (or within the file name)
    pub offset: u32,
    pub match_len: u32,
}

impl CandidateMatch {
    /// Byte range of the match within its file
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset as usize..self.offset as usize + self.match_len as usize
    }

    /// Check the candidate against the bytes of its file (or file name).
    pub fn matches(&self, haystack: &[u8]) -> bool {
        let Some(found) = haystack.get(self.range()) else {
            return false;
        };
        if self.case_sensitive {
            found == &*self.substr_bytes
        } else {
            to_lower(found) == &*self.substr_lowered
        }
    }
}

fn serialize_bytes_lossy<S: serde::Serializer>(bytes: &Arc<[u8]>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(bytes))
}
