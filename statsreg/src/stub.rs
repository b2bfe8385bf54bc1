//! No-op registry used when the facility is compiled out of a kernel
//! configuration entirely. Keeps the same public shapes as the real
//! engine so callers need no `cfg` of their own.

use core::any::Any;
use core::ptr::NonNull;

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::{Arc, Weak};

pub use crate::accumulate::Accumulator;
pub use crate::descriptor::{Aggregation, ValueDescriptor, ValueKind};
pub use crate::error::StatsError;

pub type SourceHandle = Arc<Source>;
pub type WeakSource = Weak<Source>;

/// Zero-sized stand-in for [`crate::source::Source`]. Every mutator is a
/// no-op; every query reports [`StatsError::NotFound`].
pub struct Source;

impl Source {
    pub fn create(_name: impl Into<String>) -> Arc<Source> {
        Arc::new(Source)
    }

    pub fn name(&self) -> &str {
        ""
    }

    pub fn set_presentation_handle(&self, _handle: Box<dyn Any + Send + Sync>) {}

    pub fn presentation_handle_is_set(&self) -> bool {
        false
    }

    pub fn add_values(
        &self,
        _descriptors: &'static [ValueDescriptor],
        _base: Option<NonNull<u8>>,
    ) -> Result<(), StatsError> {
        Ok(())
    }

    pub fn add_subordinate(&self, _child: Arc<Source>) {}

    pub fn remove_subordinate(&self, _child: &Arc<Source>) {}

    pub fn revoke(&self) {}

    pub fn get_value(&self, _descriptor: &ValueDescriptor) -> Result<u64, StatsError> {
        Err(StatsError::NotFound)
    }

    pub fn get_value_by_name(&self, _name: &str) -> Result<u64, StatsError> {
        Err(StatsError::NotFound)
    }

    pub fn clear(&self, _descriptor: &ValueDescriptor) -> Result<(), StatsError> {
        Err(StatsError::NotFound)
    }
}
