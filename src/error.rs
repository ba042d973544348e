//! Errors raised while building a session or computing a layout.
//!
//! Every variant aborts the layout: offsets are cumulative, so a partially computed
//! sequence would be wrong from the first failed field onward.

use crate::codec::CodecError;
use crate::primitive::{ByteOrder, NumKind};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum VisiError {
    #[error("either raw bytes or a decoded value is required")]
    Construction,
    #[error("cannot classify field {name}: {shape}")]
    Classification { name: String, shape: String },
    #[error("no primitive type for {order} {kind} of width {width}")]
    Lookup {
        order: ByteOrder,
        kind: NumKind,
        width: usize,
    },
    #[error("array {array}: count field {reference}: {reason}")]
    DependencyResolution {
        array: String,
        reference: String,
        reason: DependencyReason,
    },
    #[error("no value at {path}")]
    ValueNotFound { path: String },
    #[error("value at {path} is not {expected}")]
    ValueMismatch { path: String, expected: &'static str },
    #[error("build failed: {0}")]
    Encoding(#[source] CodecError),
    #[error("parse failed: {0}")]
    Decoding(#[source] CodecError),
}

/// Why an array's sibling count reference could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyReason {
    /// Not declared in the array's scope.
    Missing,
    /// Declared after the array.
    ForwardReference,
    /// Decoded value is not a non-negative integer.
    NotAnInteger,
}

impl fmt::Display for DependencyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyReason::Missing => write!(f, "not declared in this scope"),
            DependencyReason::ForwardReference => write!(f, "declared after the array"),
            DependencyReason::NotAnInteger => write!(f, "value is not a non-negative integer"),
        }
    }
}
