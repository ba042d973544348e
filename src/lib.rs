//! # visistruct: byte layout visualizer for binary structures
//!
//! Given a declarative [`Schema`] and either raw bytes or a decoded [`Value`], work out
//! the type, size, offset, nesting and parent of every leaf field, and partition the
//! bytes into color-tagged hex rows owned by those fields.
//!
//! ## Schema nodes
//!
//! - Constants: literal bytes
//! - Scalars: signed/unsigned integers of 1/2/4/8 bytes, floats of 2/4/8 bytes, in
//!   big, little or native byte order
//! - Enums: an integer scalar with named values
//! - Strings: null-terminated, fixed-size (zero padded) or length-prefixed, in ASCII,
//!   UTF-8, UTF-16 or UTF-32
//! - Nested structs
//! - Arrays of structs or scalars, with a fixed count or a count read from an earlier
//!   sibling field
//!
//! ## Example
//!
//! ```
//! use visistruct::{field, Node, ScalarSpec, Schema, Value, VisiStruct};
//!
//! let schema = Schema::new(vec![
//!     field("count", Node::Scalar(ScalarSpec::INT8UL)),
//!     field("values", Node::array_sized_by("count", Node::structure(vec![
//!         field("v", Node::Scalar(ScalarSpec::INT16UL)),
//!     ]))),
//! ]);
//! let v = VisiStruct::from_bytes(schema, vec![2, 0x01, 0x00, 0x02, 0x00]).unwrap();
//! assert_eq!(v.fields().len(), 3);
//! assert_eq!(v.fields()[2].offset, 5);
//! assert_eq!(v.fields()[2].parent, "values");
//! ```
//!
//! Layout decisions are logged with `tracing` at debug level.

pub mod classify;
pub mod codec;
pub mod config;
pub mod error;
pub mod field;
pub mod hex;
pub mod layout;
pub mod primitive;
pub mod render;
pub mod schema;
pub mod session;
pub mod value;

pub use codec::{build, parse, CodecError};
pub use config::Config;
pub use error::{DependencyReason, VisiError};
pub use field::{Color, Field};
pub use hex::{partition, HexCell};
pub use layout::{layout, Path};
pub use primitive::{ByteOrder, NumKind};
pub use schema::{field, ArrayCount, Encoding, LengthPrefix, Node, ScalarSpec, Schema, StringKind, Subcon};
pub use session::VisiStruct;
pub use value::{EnumValue, Value};
