//! Canonical object encoding.
//!
//! Every object is framed as:
//!
//! ```text
//! <kind> <decimal payload length>\0<payload>
//! ```
//!
//! where `kind` is `blob`, `tree` or `commit`. The digest of exactly these
//! bytes is the object's identity, so encoding is deterministic and decoding
//! must invert it without loss.

use crate::object::{Object, ObjectKind, StoredObject};

/// Errors from decoding canonical object bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The payload length differs from the length declared in the header.
    #[error("payload length {actual} does not match declared length {declared}")]
    Truncated { declared: usize, actual: usize },

    /// The header names a kind other than blob, tree or commit.
    #[error("unknown object kind {0:?}")]
    UnknownKind(String),

    /// The header or payload does not follow the format.
    #[error("malformed object: {0}")]
    Malformed(String),
}

/// Encode an object to its canonical bytes.
pub fn encode(object: &Object) -> Vec<u8> {
    encode_stored(&object.to_stored_object())
}

/// Frame an already-serialized payload with its header.
pub fn encode_stored(obj: &StoredObject) -> Vec<u8> {
    let header = format!("{} {}\0", obj.kind, obj.data.len());
    let mut out = Vec::with_capacity(header.len() + obj.data.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(&obj.data);
    out
}

/// Split canonical bytes into kind and payload, checking the declared length.
pub fn split_header(bytes: &[u8]) -> Result<(ObjectKind, &[u8]), DecodeError> {
    let nul = bytes
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| DecodeError::Malformed("missing header terminator".into()))?;
    let (header, payload) = (&bytes[..nul], &bytes[nul + 1..]);

    let space = header
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| DecodeError::Malformed("header missing length".into()))?;
    let (tag, length) = (&header[..space], &header[space + 1..]);

    let kind = ObjectKind::from_tag(tag)
        .ok_or_else(|| DecodeError::UnknownKind(String::from_utf8_lossy(tag).into_owned()))?;
    let declared = parse_length(length)?;

    if payload.len() != declared {
        return Err(DecodeError::Truncated {
            declared,
            actual: payload.len(),
        });
    }
    Ok((kind, payload))
}

/// Decode canonical bytes into a kind-tagged, undecoded payload.
pub fn decode_stored(bytes: &[u8]) -> Result<StoredObject, DecodeError> {
    let (kind, payload) = split_header(bytes)?;
    Ok(StoredObject::new(kind, payload.to_vec()))
}

/// Decode canonical bytes into a typed object.
pub fn decode(bytes: &[u8]) -> Result<Object, DecodeError> {
    Object::from_stored(&decode_stored(bytes)?)
}

fn parse_length(field: &[u8]) -> Result<usize, DecodeError> {
    let bad = || DecodeError::Malformed(format!("invalid length {:?}", String::from_utf8_lossy(field)));
    if field.is_empty() || !field.iter().all(u8::is_ascii_digit) {
        return Err(bad());
    }
    // canonical lengths have no leading zeros
    if field.len() > 1 && field[0] == b'0' {
        return Err(bad());
    }
    std::str::from_utf8(field)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(bad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::{compress, decompress};
    use crate::object::{Blob, Commit, EntryMode, Tree, TreeEntry};
    use chrono::{FixedOffset, TimeZone};
    use loam_types::{ObjectId, Signature};
    use proptest::prelude::*;

    #[test]
    fn blob_encoding_layout() {
        let bytes = encode(&Object::Blob(Blob::new(b"hello\n".to_vec())));
        assert_eq!(bytes, b"blob 6\0hello\n");
    }

    #[test]
    fn empty_blob_encoding() {
        let bytes = encode(&Object::Blob(Blob::new(Vec::new())));
        assert_eq!(bytes, b"blob 0\0");
        assert_eq!(decode(&bytes).unwrap(), Object::Blob(Blob::new(Vec::new())));
    }

    #[test]
    fn blob_payload_may_contain_nul() {
        let obj = Object::Blob(Blob::new(b"a\0b\0".to_vec()));
        assert_eq!(decode(&encode(&obj)).unwrap(), obj);
    }

    #[test]
    fn short_payload_is_truncated() {
        let err = decode(b"blob 10\0short").unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                declared: 10,
                actual: 5
            }
        );
    }

    #[test]
    fn long_payload_is_truncated() {
        let err = decode(b"blob 1\0ab").unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { declared: 1, actual: 2 }));
    }

    #[test]
    fn unknown_kind() {
        let err = decode(b"tag 0\0").unwrap_err();
        assert_eq!(err, DecodeError::UnknownKind("tag".into()));
    }

    #[test]
    fn missing_terminator_is_malformed() {
        assert!(matches!(decode(b"blob 5"), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn bad_length_is_malformed() {
        assert!(matches!(decode(b"blob x\0"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode(b"blob \0"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode(b"blob +1\0a"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode(b"blob0\0"), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn zero_padded_length_is_malformed() {
        assert!(matches!(decode(b"blob 01\0a"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode(b"blob 00\0"), Err(DecodeError::Malformed(_))));
        assert!(decode(b"blob 0\0").is_ok());
        assert!(decode(b"blob 10\00123456789").is_ok());
    }

    #[test]
    fn tree_short_digest_surfaces_through_decode() {
        let mut payload = b"100644 f\0".to_vec();
        payload.extend_from_slice(&[7; 5]);
        let mut bytes = format!("tree {}\0", payload.len()).into_bytes();
        bytes.extend_from_slice(&payload);
        assert!(matches!(decode(&bytes), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn split_header_returns_payload_slice() {
        let (kind, payload) = split_header(b"commit 3\0abc").unwrap();
        assert_eq!(kind, ObjectKind::Commit);
        assert_eq!(payload, b"abc");
    }

    fn arb_id() -> impl Strategy<Value = ObjectId> {
        any::<[u8; 20]>().prop_map(ObjectId::from_hash)
    }

    fn arb_signature() -> impl Strategy<Value = Signature> {
        ("[A-Za-z][A-Za-z ]{0,15}[A-Za-z]", "[a-z]{1,8}@[a-z]{1,8}\\.org", 0i64..4_000_000_000, -12i32..=12)
            .prop_map(|(name, email, secs, hours)| {
                let when = FixedOffset::east_opt(hours * 3600)
                    .unwrap()
                    .timestamp_opt(secs, 0)
                    .unwrap();
                Signature::new(name, email, when)
            })
    }

    fn arb_entry() -> impl Strategy<Value = TreeEntry> {
        let mode = prop_oneof![
            Just(EntryMode::Regular),
            Just(EntryMode::Executable),
            Just(EntryMode::Symlink),
            Just(EntryMode::Directory),
        ];
        (mode, "[A-Za-z0-9._-]{1,12}", arb_id()).prop_map(|(m, n, id)| TreeEntry::new(m, n, id))
    }

    fn arb_object() -> impl Strategy<Value = Object> {
        prop_oneof![
            proptest::collection::vec(any::<u8>(), 0..256).prop_map(|d| Object::Blob(Blob::new(d))),
            proptest::collection::vec(arb_entry(), 0..8).prop_map(|e| Object::Tree(Tree::new(e))),
            (arb_id(), proptest::option::of(arb_id()), arb_signature(), arb_signature(), ".{0,64}")
                .prop_map(|(tree, parent, author, committer, message)| {
                    Object::Commit(Commit {
                        tree,
                        parent,
                        author,
                        committer,
                        message,
                    })
                }),
        ]
    }

    proptest! {
        #[test]
        fn encode_compress_decode_roundtrip(obj in arb_object()) {
            let encoded = encode(&obj);
            let restored = decompress(&compress(&encoded).unwrap()).unwrap();
            prop_assert_eq!(decode(&restored).unwrap(), obj);
        }
    }
}
