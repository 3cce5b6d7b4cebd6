// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Branded ID generation abstractions.
//!
//! All entity identifiers in this crate are newtypes wrapping a short
//! prefixed random string, generated via [`define_id!`]. Prefixes make IDs
//! self-describing in logs (`"tsk-..."` is obviously a task, not an agent)
//! and let `from_string` reject cross-type id confusion at the call site
//! when callers choose to check `PREFIX`.

/// Upper bound on an inline id's byte length: a 4-byte type prefix plus a
/// 19-character nanoid suffix.
pub const ID_MAX_LEN: usize = 23;

/// Truncates `s` to its first `n` characters, returning it unchanged if it's
/// already shorter.
pub fn short(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((cut, _)) => &s[..cut],
        None => s,
    }
}

/// A branded id's storage: a stack-allocated byte run capped at
/// [`ID_MAX_LEN`], cheap enough to pass by value everywhere ids flow.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct IdBuf {
    bytes: [u8; ID_MAX_LEN],
    used: u8,
}

impl IdBuf {
    pub const fn empty() -> Self {
        Self { bytes: [0; ID_MAX_LEN], used: 0 }
    }

    /// Builds an `IdBuf` from `s`. Debug builds assert `s` fits in
    /// [`ID_MAX_LEN`] bytes; release builds silently truncate, since a
    /// truncated id is still preferable to a panic in the field.
    pub fn new(s: &str) -> Self {
        debug_assert!(
            s.len() <= ID_MAX_LEN,
            "id exceeds {} bytes ({} bytes): {:?}",
            ID_MAX_LEN,
            s.len(),
            s,
        );
        let mut bytes = [0u8; ID_MAX_LEN];
        for (slot, byte) in bytes.iter_mut().zip(s.as_bytes()) {
            *slot = *byte;
        }
        Self { bytes, used: s.len().min(ID_MAX_LEN) as u8 }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..self.used as usize]).expect("IdBuf holds non-UTF-8 bytes")
    }

    pub fn is_empty(&self) -> bool {
        self.used == 0
    }
}

// Forwarding the hash to the string view (rather than hashing the raw byte
// array) is required for `Borrow<str>` map lookups: `k1 == k2` and
// `hash(k1) == hash(k2)` must agree whether `k` is viewed as an `IdBuf` or
// as `&str`.
impl std::hash::Hash for IdBuf {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl std::borrow::Borrow<str> for IdBuf {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Debug for IdBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self.as_str(), f)
    }
}

impl std::fmt::Display for IdBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for IdBuf {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for IdBuf {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <&str>::deserialize(deserializer)?;
        if s.len() > ID_MAX_LEN {
            return Err(serde::de::Error::custom(format!("id exceeds {ID_MAX_LEN} bytes: {s:?}")));
        }
        Ok(IdBuf::new(s))
    }
}

/// Defines a newtype id wrapper around [`IdBuf`] carrying a fixed type
/// prefix.
///
/// Generates `new()` for random id generation, `from_string()` for trusted
/// parsing (internal callers, e.g. storage deserialization),
/// `try_from_string()` for untrusted input (rejects the empty string),
/// `as_str()`, `suffix()`, `short()`, `Display`, `From<String>`,
/// `From<&str>`, `PartialEq<str>`, `PartialEq<&str>`, `Borrow<str>`, and
/// `Deref` implementations.
///
/// ```ignore
/// define_id! {
///     /// Doc comment for the ID type.
///     pub struct TaskId("tsk-");
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $crate::id::IdBuf);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generates a fresh id: the type prefix followed by a 19-char
            /// random nanoid suffix.
            pub fn new() -> Self {
                let suffix = nanoid::nanoid!(19);
                Self($crate::id::IdBuf::new(&format!("{}{suffix}", Self::PREFIX)))
            }

            /// Wraps a trusted source string (already validated, e.g. read
            /// back out of storage) without further checks.
            pub fn from_string(id: impl AsRef<str>) -> Self {
                Self($crate::id::IdBuf::new(id.as_ref()))
            }

            /// Wraps an untrusted string, rejecting the empty case.
            pub fn try_from_string(id: impl AsRef<str>) -> Result<Self, $crate::error::CoreError> {
                let s = id.as_ref();
                if s.is_empty() {
                    return Err($crate::error::CoreError::validation(format!(
                        "{} id must not be empty",
                        stringify!($name)
                    )));
                }
                Ok(Self::from_string(s))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// The id with its type prefix stripped.
            pub fn suffix(&self) -> &str {
                self.0.as_str().strip_prefix(Self::PREFIX).unwrap_or_else(|| self.0.as_str())
            }

            /// The suffix, truncated to at most `n` characters.
            pub fn short(&self, n: usize) -> &str {
                $crate::id::short(self.suffix(), n)
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.0.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from_string(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::from_string(s)
            }
        }

        impl From<&String> for $name {
            fn from(s: &String) -> Self {
                Self::from_string(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0.as_str() == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0.as_str() == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                self.0.as_str()
            }
        }
    };
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
