//! Append-only event log authenticated by a hyper tree.
//!
//! A [`Balloon`] hashes every event, assigns it the next version and records it in a
//! [`balloon_hyper::HyperTree`]. Clients keep a [`Snapshot`] of the root and later check
//! [`MembershipProof`]s against it without access to the store.

mod balloon;
pub mod config;
mod error;

pub use balloon::{Balloon, MembershipProof, Snapshot};
pub use error::BalloonError;
