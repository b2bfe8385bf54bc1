//! The registry tree node: reference-counted, lock-protected, owning a
//! list of value groups and a list of subordinate sources.

use core::any::Any;
use core::ptr::NonNull;

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use spin::RwLock;

use crate::accumulate::Accumulator;
use crate::descriptor::ValueDescriptor;
use crate::error::StatsError;
use crate::group::ValueGroup;

/// Strong handle to a source. `source_get`/`source_put` in the original
/// facility correspond to cloning and dropping this handle; destruction
/// runs automatically when the last clone is dropped.
pub type SourceHandle = Arc<Source>;

/// Weak handle to a source, used at consumer entry points that must not
/// keep a source alive past its producer's intended lifetime.
/// [`Weak::upgrade`] is the try-acquire-if-nonzero primitive a
/// presentation layer's open path needs to race safely with a
/// concurrent final `put`.
pub type WeakSource = Weak<Source>;

struct Inner {
    value_groups: Vec<ValueGroup>,
    subordinates: Vec<Arc<Source>>,
    presentation_handle: Option<Box<dyn Any + Send + Sync>>,
}

/// A named node in the registry tree.
pub struct Source {
    name: String,
    inner: RwLock<Inner>,
}

impl Source {
    /// Creates a source with no value groups and no subordinates.
    pub fn create(name: impl Into<String>) -> Arc<Source> {
        Arc::new(Source {
            name: name.into(),
            inner: RwLock::new(Inner {
                value_groups: Vec::new(),
                subordinates: Vec::new(),
                presentation_handle: None,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attaches an opaque presentation-layer handle (e.g. a dentry) to
    /// this source. The registry core never inspects it.
    pub fn set_presentation_handle(&self, handle: Box<dyn Any + Send + Sync>) {
        self.inner.write().presentation_handle = Some(handle);
    }

    pub fn presentation_handle_is_set(&self) -> bool {
        self.inner.read().presentation_handle.is_some()
    }

    /// Attaches a value group binding `descriptors` to `base`. `base` of
    /// `None` registers a placeholder group that declares `descriptors`
    /// as an aggregate at this node rather than a set of leaves.
    ///
    /// Fails with [`StatsError::AlreadyExists`] if a group with the same
    /// `(descriptors, base)` pair is already attached; the existing
    /// group is left untouched.
    pub fn add_values(
        &self,
        descriptors: &'static [ValueDescriptor],
        base: Option<NonNull<u8>>,
    ) -> Result<(), StatsError> {
        let mut inner = self.inner.write();
        if inner.value_groups.iter().any(|g| g.same_attachment(base, descriptors)) {
            return Err(StatsError::AlreadyExists);
        }
        inner.value_groups.insert(0, ValueGroup::new(base, descriptors));
        Ok(())
    }

    /// Links `child` under `self`, taking the refcount the parent holds
    /// for as long as the child is listed. No cycle detection is
    /// performed; callers must not create cycles, since every walk in
    /// this registry goes strictly top-down and relies on the tree
    /// staying acyclic.
    pub fn add_subordinate(&self, child: Arc<Source>) {
        self.inner.write().subordinates.push(child);
    }

    /// Unlinks `child` if present, releasing the parent's refcount on
    /// it. No-op if `child` is not currently a subordinate.
    pub fn remove_subordinate(&self, child: &Arc<Source>) {
        let mut inner = self.inner.write();
        if let Some(pos) = inner.subordinates.iter().position(|s| Arc::ptr_eq(s, child)) {
            inner.subordinates.remove(pos);
        }
    }

    /// Clears the backing pointer of every value group on this source
    /// (not its subordinates'). The source stays alive; subsequent
    /// reads of its own leaves return 0. Call this before freeing the
    /// backing memory a producer registered, independent of when the
    /// source itself is eventually destroyed.
    pub fn revoke(&self) {
        let mut inner = self.inner.write();
        for group in inner.value_groups.iter_mut() {
            group.base = None;
        }
    }

    /// Reads a single leaf, or a recursive aggregate rooted at `self` if
    /// `descriptor` identifies a placeholder group. `descriptor` is
    /// matched by identity (pointer equality) against the entries of
    /// this source's own value groups; parents and siblings are never
    /// searched.
    pub fn get_value(&self, descriptor: &ValueDescriptor) -> Result<u64, StatsError> {
        let inner = self.inner.read();
        for group in &inner.value_groups {
            if group.find(descriptor).is_some() {
                return Ok(match group.read(descriptor) {
                    Some(value) => value,
                    None => {
                        let mut acc = Accumulator::new(descriptor.kind.is_signed());
                        aggregate_subtree(&inner, group.descriptors, descriptor, &mut acc);
                        acc.reduce(descriptor.aggr, descriptor.kind.is_signed())
                    }
                });
            }
        }
        log::debug!("get_value: no descriptor matched on source {:?}", self.name);
        Err(StatsError::NotFound)
    }

    /// Looks up a descriptor by name among this source's own value
    /// groups, then reads it exactly as [`Source::get_value`] would.
    /// The name search and the value read happen against the same
    /// already-found group, so unlike a name-then-identity two-pass
    /// lookup, the owning group is never searched twice.
    pub fn get_value_by_name(&self, name: &str) -> Result<u64, StatsError> {
        let inner = self.inner.read();
        for group in &inner.value_groups {
            if let Some(descriptor) = group.find_by_name(name) {
                return Ok(match group.read(descriptor) {
                    Some(value) => value,
                    None => {
                        let mut acc = Accumulator::new(descriptor.kind.is_signed());
                        aggregate_subtree(&inner, group.descriptors, descriptor, &mut acc);
                        acc.reduce(descriptor.aggr, descriptor.kind.is_signed())
                    }
                });
            }
        }
        log::debug!("get_value_by_name: {:?} not found on source {:?}", name, self.name);
        Err(StatsError::NotFound)
    }

    /// Zeroes a single leaf, or every matching leaf in the subtree if
    /// `descriptor` identifies a placeholder group. Takes only the read
    /// lock at every node visited: it mutates producer-owned backing
    /// memory, not this source's own lists.
    pub fn clear(&self, descriptor: &ValueDescriptor) -> Result<(), StatsError> {
        let inner = self.inner.read();
        for group in &inner.value_groups {
            if group.find(descriptor).is_some() {
                if group.read(descriptor).is_some() {
                    group.clear(descriptor);
                } else {
                    clear_subtree(&inner, group.descriptors, descriptor);
                }
                return Ok(());
            }
        }
        Err(StatsError::NotFound)
    }
}

fn aggregate_subtree(
    inner: &Inner,
    reference: &'static [ValueDescriptor],
    descriptor: &ValueDescriptor,
    acc: &mut Accumulator,
) {
    for group in &inner.value_groups {
        if group.is_reference_group(reference) {
            if let Some(value) = group.read(descriptor) {
                acc.fold(value, descriptor.kind.is_signed());
            }
        }
    }
    for child in &inner.subordinates {
        let child_inner = child.inner.read();
        aggregate_subtree(&child_inner, reference, descriptor, acc);
    }
}

fn clear_subtree(inner: &Inner, reference: &'static [ValueDescriptor], descriptor: &ValueDescriptor) {
    for group in &inner.value_groups {
        if group.is_reference_group(reference) {
            group.clear(descriptor);
        }
    }
    for child in &inner.subordinates {
        let child_inner = child.inner.read();
        clear_subtree(&child_inner, reference, descriptor);
    }
}
