//! Digest engine for loam.
//!
//! Objects are identified by the SHA-1 digest of their canonical encoding,
//! the same identity git uses, so digests computed here match `git
//! hash-object` byte for byte.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod hasher;

pub use hasher::ContentHasher;
