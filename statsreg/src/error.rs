use thiserror::Error;

/// Failure modes surfaced by the registry. None of these are fatal to the
/// registry itself; every operation that can fail returns one of these
/// instead of panicking on caller-supplied input.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StatsError {
    /// Allocation failed while creating a source or attaching a value
    /// group. The registry is left exactly as it was before the call.
    #[error("allocation failed while mutating the registry")]
    OutOfMemory,

    /// A value group with this exact (descriptor array, base address)
    /// pair is already attached to the source.
    #[error("a value group with this descriptor array and base address is already attached")]
    AlreadyExists,

    /// Neither a descriptor-identity match nor a name match was found in
    /// the starting source. Parents and siblings are never searched.
    #[error("no matching descriptor was found in the starting source")]
    NotFound,
}
