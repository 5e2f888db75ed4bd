//! # Serialisation
//!
//! Two encodings of a [`Properties`](crate::reflect::Properties) collection,
//! dispatched on [`PropertyKind`](crate::reflect::PropertyKind):
//!
//! - [`text`]: `name\nvalue\n` pairs with a `next` line closing each object.
//!   World save files use this format (see
//!   [`World::save_text`](crate::world::World::save_text)).
//! - [`binary`]: little-endian, values only, strings prefixed with an 8-byte
//!   length.
//!
//! Both work against the live property table, so any reflected type can be
//! saved and restored without writing per-type code.

pub mod binary;
pub mod text;

pub use binary::{read_binary, write_binary};
pub use text::{NEXT, RawField, TextReader, from_text, to_text, write_block};
