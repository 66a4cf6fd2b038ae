//! # `srecordlib`
//!
//! `srecordlib` is a Rust library for parsing, validating, editing and generating
//! Motorola S-Record files.
//!
//! The library provides:
//! - Parser and composer for S-Record files (via [`SRecord`] struct).
//! - Sparse memory image of address-ordered, non-overlapping [`Block`]s with range
//!   operations (read with fill, overwrite, remove, merge, find).
//! - Error handling with [`SRecordError`].
//! - Iteration over concatenated records with [`SRecordStream`].
//!
//! ## Example
//!
//! ```
//! use srecordlib::SRecord;
//!
//! let mut srec = SRecord::from_srec("tests/fixtures/example.s19").unwrap();
//! srec.set_bytes(0x1000, b"patched").unwrap();
//! srec.write_srec("build/ex2/example.s19", None).unwrap();
//! ```

mod block;
mod composer;
mod error;
mod parser;
mod record;
mod search;
mod srecord;

// Public APIs
pub use block::Block;
pub use error::{SRecordError, SRecordErrorKind};
pub use parser::SRecordStream;
pub use record::{AddressWidth, RecordType, decode_hex_pair, encode_hex};
pub use search::SearchType;
pub use srecord::{Endianness, SRecord};
