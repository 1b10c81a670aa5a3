//! Error type shared by the lamina crates.

use std::collections::TryReserveError;

use thiserror::Error;

use crate::IsaVariant;

/// Errors reported before any kernel runs. A call that fails never writes to its
/// output matrix.
#[derive(Debug, Error)]
pub enum GemmError {
    /// Leading dimension smaller than the stored row length.
    #[error("leading dimension of {operand} is {ld}, expected at least {min}")]
    InvalidLeadingDimension { operand: &'static str, ld: usize, min: usize },

    /// Backing storage shorter than the view requires.
    #[error("{operand} holds {len} elements but the view requires {required}")]
    BufferTooSmall { operand: &'static str, len: usize, required: usize },

    /// Output matrices of consecutive batch entries would overlap.
    #[error("batch stride of {operand} is {stride}, expected at least {min}")]
    InvalidBatchStride { operand: &'static str, stride: usize, min: usize },

    /// The extent of a view or batch does not fit in `usize`.
    #[error("size of {operand} overflows the address space")]
    SizeOverflow { operand: &'static str },

    /// Packing requires a panel with at least one row and one column.
    #[error("cannot pack an empty {rows}x{cols} panel")]
    EmptyPanel { rows: usize, cols: usize },

    /// Band width or row tile of zero passed to a packing call.
    #[error("packing {param} must be nonzero")]
    ZeroPanelWidth { param: &'static str },

    /// Scratch memory for a packed panel could not be obtained.
    #[error("failed to allocate a packing buffer of {elems} elements")]
    Allocation {
        elems: usize,
        #[source]
        source: TryReserveError,
    },

    /// A forced kernel variant needs an extension this cpu does not have.
    #[error("{0} kernels are not supported by this cpu")]
    UnsupportedIsa(IsaVariant),

    #[error("unknown isa variant `{0}`, expected one of baseline, avx, avx2fma3, avx512f")]
    UnknownIsa(String),
}

/// Result type for lamina operations.
pub type Result<T> = std::result::Result<T, GemmError>;
