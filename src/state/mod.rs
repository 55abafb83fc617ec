//! State module for tracking crawl progress
//!
//! The only shared mutable state in a run is the set of URLs already fetched
//! successfully, reconstructed from the ledger at startup.

mod visited;

pub use visited::VisitedSet;
