//! A value group: a descriptor array bound to a concrete backing base
//! address, and the unaligned field access used to read or clear a leaf.

use core::ptr::NonNull;

use crate::descriptor::{ValueDescriptor, ValueKind, same_array};

/// One attachment of a descriptor array to a backing struct, or a
/// *placeholder group* (`base: None`) that declares a descriptor as an
/// aggregate at this node instead of a leaf.
///
/// `base` is cleared by `revoke`, independent of the group's own or the
/// owning source's lifetime; a group whose base has been cleared is
/// simply skipped during aggregation.
pub struct ValueGroup {
    pub(crate) base: Option<NonNull<u8>>,
    pub(crate) descriptors: &'static [ValueDescriptor],
}

// `NonNull<u8>` is not `Send`/`Sync` on its own; the backing memory it
// points at is owned by a producer who is responsible for keeping it
// alive (or calling `revoke` before freeing it) regardless of which
// thread reads it.
unsafe impl Send for ValueGroup {}
unsafe impl Sync for ValueGroup {}

impl ValueGroup {
    pub(crate) fn new(base: Option<NonNull<u8>>, descriptors: &'static [ValueDescriptor]) -> Self {
        Self { base, descriptors }
    }

    pub(crate) fn same_attachment(&self, base: Option<NonNull<u8>>, descriptors: &'static [ValueDescriptor]) -> bool {
        self.base == base && same_array(self.descriptors, descriptors)
    }

    pub(crate) fn is_reference_group(&self, descriptors: &'static [ValueDescriptor]) -> bool {
        same_array(self.descriptors, descriptors)
    }

    pub(crate) fn find(&self, descriptor: &ValueDescriptor) -> Option<&ValueDescriptor> {
        self.descriptors.iter().find(|d| core::ptr::eq(*d, descriptor))
    }

    pub(crate) fn find_by_name(&self, name: &str) -> Option<&'static ValueDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Reads the field addressed by `descriptor`, zero- or sign-extended
    /// to `u64`. `None` if this group has been revoked.
    pub(crate) fn read(&self, descriptor: &ValueDescriptor) -> Option<u64> {
        self.base.map(|base| unsafe { read_field(base, descriptor) })
    }

    /// Zeroes the field addressed by `descriptor`. No-op if this group
    /// has been revoked.
    pub(crate) fn clear(&self, descriptor: &ValueDescriptor) {
        if let Some(base) = self.base {
            unsafe { write_zero(base, descriptor) };
        }
    }
}

/// Reads the field at `descriptor.offset` bytes from `base`, using an
/// unaligned load so producer struct layout is free to place counters
/// at any byte offset.
///
/// # Safety
/// `base` must point at a live allocation at least `offset + width`
/// bytes long, for as long as the caller holds the owning source's lock.
unsafe fn read_field(base: NonNull<u8>, descriptor: &ValueDescriptor) -> u64 {
    let ptr = unsafe { base.as_ptr().add(descriptor.offset) };
    unsafe {
        match descriptor.kind {
            ValueKind::U8 => ptr.read_unaligned() as u64,
            ValueKind::Bool => u64::from(ptr.read_unaligned() != 0),
            ValueKind::U16 => ptr.cast::<u16>().read_unaligned() as u64,
            ValueKind::U32 => ptr.cast::<u32>().read_unaligned() as u64,
            ValueKind::U64 => ptr.cast::<u64>().read_unaligned(),
            ValueKind::S8 => ptr.cast::<i8>().read_unaligned() as i64 as u64,
            ValueKind::S16 => ptr.cast::<i16>().read_unaligned() as i64 as u64,
            ValueKind::S32 => ptr.cast::<i32>().read_unaligned() as i64 as u64,
            ValueKind::S64 => ptr.cast::<i64>().read_unaligned() as u64,
        }
    }
}

/// # Safety
/// Same contract as [`read_field`].
unsafe fn write_zero(base: NonNull<u8>, descriptor: &ValueDescriptor) {
    let ptr = unsafe { base.as_ptr().add(descriptor.offset) };
    unsafe {
        match descriptor.kind {
            ValueKind::U8 | ValueKind::Bool => ptr.write_unaligned(0u8),
            ValueKind::U16 => ptr.cast::<u16>().write_unaligned(0),
            ValueKind::U32 => ptr.cast::<u32>().write_unaligned(0),
            ValueKind::U64 => ptr.cast::<u64>().write_unaligned(0),
            ValueKind::S8 => ptr.cast::<i8>().write_unaligned(0),
            ValueKind::S16 => ptr.cast::<i16>().write_unaligned(0),
            ValueKind::S32 => ptr.cast::<i32>().write_unaligned(0),
            ValueKind::S64 => ptr.cast::<i64>().write_unaligned(0),
        }
    }
}
