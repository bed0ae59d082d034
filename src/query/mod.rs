pub mod candidate;
pub mod doc_iter;
pub mod planner;
pub mod substring;

pub use candidate::CandidateMatch;
pub use doc_iter::{BruteForceIter, DocIterator, NgramDocIter};
pub use planner::{ContentPlan, MatchGeometry, NgramSelection, plan_content, select_rarest_pair};
pub use substring::Substring;
