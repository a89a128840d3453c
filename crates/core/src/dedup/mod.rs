//! Duplicate detection and fusion for scraped observations.
//!
//! [`cluster`] groups observations that share a title or a link, closing the
//! relation transitively; [`fuse`] turns each group into one
//! [`CanonicalVideo`](crate::observation::CanonicalVideo) by majority vote.
//! [`deduplicate_sorted`] is the lightweight alternative that only drops
//! exact duplicates found close together in title order.

mod clustering;
mod fusion;
mod window;

pub use clustering::{cluster, DuplicateCluster};
pub use fusion::fuse;
pub use window::{deduplicate_sorted, DEFAULT_WINDOW};
