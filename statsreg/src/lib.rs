//! A hierarchical statistics registry.
//!
//! Producers register named sources, attach value groups that describe
//! fields inside their own structs, and link sources into a tree that
//! mirrors ownership. Consumers read either a single leaf or, at an
//! inner node carrying a placeholder group, a recursive aggregate
//! (sum/min/max/avg/count-of-zeros) over the whole subtree.
//!
//! Production builds are `no_std` + `alloc`; `cfg(test)` builds link the
//! host standard library so the concurrency tests can use real threads.

#![cfg_attr(not(test), no_std)]

extern crate alloc;
#[cfg(test)]
extern crate std;

pub mod accumulate;
pub mod descriptor;
pub mod error;
pub mod group;
pub mod source;

#[cfg(feature = "stub")]
pub mod stub;

#[cfg(not(feature = "stub"))]
pub use accumulate::Accumulator;
#[cfg(not(feature = "stub"))]
pub use descriptor::{Aggregation, ValueDescriptor, ValueKind};
#[cfg(not(feature = "stub"))]
pub use error::StatsError;
#[cfg(not(feature = "stub"))]
pub use source::{Source, SourceHandle, WeakSource};

#[cfg(feature = "stub")]
pub use stub::*;
