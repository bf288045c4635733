use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use twox_hash::XxHash64;

/// One path segment: the raw key bytes plus their precomputed hash.
///
/// Equality checks the hash first and falls back to the bytes, so two
/// distinct keys whose hashes collide are still told apart. [`Hash`] feeds
/// only the precomputed value.
#[derive(Clone)]
pub struct IndexKey {
    bytes: Box<[u8]>,
    hash: u64,
}

impl IndexKey {
    pub fn new(key: &str) -> Self {
        Self::from_bytes(key.as_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            hash: hash_key(bytes),
            bytes: bytes.into(),
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length of the key in bytes, without the NUL terminator it carries on
    /// the wire.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn hash_value(&self) -> u64 {
        self.hash
    }
}

fn hash_key(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}

impl PartialEq for IndexKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.bytes == other.bytes
    }
}

impl Eq for IndexKey {}

impl Hash for IndexKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Debug for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.bytes) {
            Ok(s) => write!(f, "IndexKey({s:?})"),
            Err(_) => write!(f, "IndexKey({:?})", &self.bytes),
        }
    }
}

impl From<&str> for IndexKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for IndexKey {
    fn from(key: String) -> Self {
        Self {
            hash: hash_key(key.as_bytes()),
            bytes: key.into_bytes().into_boxed_slice(),
        }
    }
}

/// One step of a trie path.
///
/// A prebuilt [`IndexKey`] is borrowed as is, so callers resolving the same
/// path repeatedly can hash each segment once. Text and byte segments are
/// hashed on every call.
pub trait PathSegment {
    fn index_key(&self) -> Cow<'_, IndexKey>;
}

impl PathSegment for IndexKey {
    fn index_key(&self) -> Cow<'_, IndexKey> {
        Cow::Borrowed(self)
    }
}

impl PathSegment for str {
    fn index_key(&self) -> Cow<'_, IndexKey> {
        Cow::Owned(IndexKey::new(self))
    }
}

impl PathSegment for String {
    fn index_key(&self) -> Cow<'_, IndexKey> {
        Cow::Owned(IndexKey::new(self))
    }
}

impl PathSegment for [u8] {
    fn index_key(&self) -> Cow<'_, IndexKey> {
        Cow::Owned(IndexKey::from_bytes(self))
    }
}

impl<T: PathSegment + ?Sized> PathSegment for &T {
    fn index_key(&self) -> Cow<'_, IndexKey> {
        (**self).index_key()
    }
}
