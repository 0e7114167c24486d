//! Foundation types for loam.
//!
//! This crate provides the value types shared by every other loam crate.
//! It has no I/O and no knowledge of the object encoding.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed identifier (SHA-1 digest, 20 bytes)
//! - [`Signature`] -- Author/committer identity with a timezone-aware timestamp
//! - [`Clock`] -- Injectable time source for commit metadata

pub mod error;
pub mod object;
pub mod signature;
pub mod temporal;

pub use error::TypeError;
pub use object::ObjectId;
pub use signature::Signature;
pub use temporal::{Clock, FixedClock, SystemClock};
