//! Error types for the validated GEMM layer.

use thiserror::Error;

use crate::simd::SimdLevel;

/// Errors reported by the safe entry points.
///
/// The raw kernels and drivers never produce these; they are raised by the
/// layer that turns caller parameters into a plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GemmError {
    /// One of M, N or K is zero where a plan needs all three.
    #[error("matrix dimensions must be non-zero (m={m}, n={n}, k={k})")]
    ZeroDimension { m: usize, n: usize, k: usize },

    /// Leading dimension smaller than the logical row length.
    #[error("stride of {operand} is {stride}, less than its {cols} columns")]
    StrideTooSmall {
        operand: &'static str,
        stride: usize,
        cols: usize,
    },

    /// Backing slice shorter than the view it must hold.
    #[error("buffer for {operand} holds {len} elements, {required} required")]
    BufferTooSmall {
        operand: &'static str,
        len: usize,
        required: usize,
    },

    /// Operand shapes do not agree.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A packed B buffer was produced by a different plan.
    #[error("packed B was built for {found}, plan expects {expected}")]
    PlanMismatch { expected: String, found: String },

    /// The CPU cannot execute the requested level.
    #[error("SIMD level {0} is not supported on this CPU")]
    UnsupportedLevel(SimdLevel),

    /// A level name that does not parse.
    #[error("unknown SIMD level: {0}")]
    UnknownLevel(String),

    /// Dispatch was already bound to another level.
    #[error("kernels already bound to {bound}, cannot rebind to {requested}")]
    AlreadyInitialized {
        bound: SimdLevel,
        requested: SimdLevel,
    },

    /// A configuration value that does not parse.
    #[error("invalid configuration value: {0}")]
    InvalidConfig(String),
}

/// Result type for GEMM operations.
pub type Result<T> = std::result::Result<T, GemmError>;
