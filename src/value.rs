//! Typed values held by the store.
//!
//! [`KvsValue`] is a closed sum type. Container variants hold their children
//! behind an [`Arc`], so cloning a value (or embedding an already built value
//! in a new container) never copies a subtree.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{KvsError, Result};

/// Ordered sequence of values.
pub type KvsArray = Vec<KvsValue>;

/// String-keyed object. Keys are unique and keep insertion order.
pub type KvsMap = IndexMap<String, KvsValue>;

/// The kind of a [`KvsValue`], one per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KvsValueKind {
    Null,
    Boolean,
    I32,
    U32,
    I64,
    U64,
    F64,
    String,
    Array,
    Object,
}

impl KvsValueKind {
    /// Every kind, in declaration order.
    pub const ALL: [KvsValueKind; 10] = [
        Self::Null,
        Self::Boolean,
        Self::I32,
        Self::U32,
        Self::I64,
        Self::U64,
        Self::F64,
        Self::String,
        Self::Array,
        Self::Object,
    ];

    /// Type tag written to the `"t"` field of a persisted entry.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "bool",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::I64 => "i64",
            Self::U64 => "u64",
            Self::F64 => "f64",
            Self::String => "str",
            Self::Array => "arr",
            Self::Object => "obj",
        }
    }

    /// Inverse of [`KvsValueKind::tag`].
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for KvsValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A storable value.
///
/// Equality compares the kind first and then the payload; arrays compare
/// element-wise and objects compare as maps.
#[derive(Debug, Clone, PartialEq)]
pub enum KvsValue {
    Null,
    Boolean(bool),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F64(f64),
    String(String),
    Array(Arc<KvsArray>),
    Object(Arc<KvsMap>),
}

impl KvsValue {
    /// Build an array from any sequence of values.
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<KvsValue>,
    {
        Self::Array(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build an object from `(key, value)` pairs. A repeated key keeps its
    /// first position and takes the last value.
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<KvsValue>,
    {
        Self::Object(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    pub fn kind(&self) -> KvsValueKind {
        match self {
            Self::Null => KvsValueKind::Null,
            Self::Boolean(_) => KvsValueKind::Boolean,
            Self::I32(_) => KvsValueKind::I32,
            Self::U32(_) => KvsValueKind::U32,
            Self::I64(_) => KvsValueKind::I64,
            Self::U64(_) => KvsValueKind::U64,
            Self::F64(_) => KvsValueKind::F64,
            Self::String(_) => KvsValueKind::String,
            Self::Array(_) => KvsValueKind::Array,
            Self::Object(_) => KvsValueKind::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Boolean(v) => Ok(*v),
            other => Err(other.mismatch(KvsValueKind::Boolean)),
        }
    }

    pub fn as_i32(&self) -> Result<i32> {
        match self {
            Self::I32(v) => Ok(*v),
            other => Err(other.mismatch(KvsValueKind::I32)),
        }
    }

    pub fn as_u32(&self) -> Result<u32> {
        match self {
            Self::U32(v) => Ok(*v),
            other => Err(other.mismatch(KvsValueKind::U32)),
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Self::I64(v) => Ok(*v),
            other => Err(other.mismatch(KvsValueKind::I64)),
        }
    }

    pub fn as_u64(&self) -> Result<u64> {
        match self {
            Self::U64(v) => Ok(*v),
            other => Err(other.mismatch(KvsValueKind::U64)),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Self::F64(v) => Ok(*v),
            other => Err(other.mismatch(KvsValueKind::F64)),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Self::String(v) => Ok(v),
            other => Err(other.mismatch(KvsValueKind::String)),
        }
    }

    pub fn as_array(&self) -> Result<&KvsArray> {
        match self {
            Self::Array(v) => Ok(v),
            other => Err(other.mismatch(KvsValueKind::Array)),
        }
    }

    pub fn as_object(&self) -> Result<&KvsMap> {
        match self {
            Self::Object(v) => Ok(v),
            other => Err(other.mismatch(KvsValueKind::Object)),
        }
    }

    /// Number of children of an array or object; `None` for scalars.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Array(items) => Some(items.len()),
            Self::Object(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// Element of an array by position.
    ///
    /// Fails with `TypeMismatch` on a non-array and `KeyNotFound` when the
    /// index is out of range.
    pub fn get_index(&self, index: usize) -> Result<&KvsValue> {
        self.as_array()?
            .get(index)
            .ok_or_else(|| KvsError::KeyNotFound(format!("[{}]", index)))
    }

    /// Field of an object by key.
    pub fn get_field(&self, key: &str) -> Result<&KvsValue> {
        self.as_object()?
            .get(key)
            .ok_or_else(|| KvsError::KeyNotFound(key.to_string()))
    }

    fn mismatch(&self, expected: KvsValueKind) -> KvsError {
        KvsError::type_mismatch(expected, self.kind())
    }
}

impl From<()> for KvsValue {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

macro_rules! impl_scalar_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for KvsValue {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }

            impl TryFrom<&KvsValue> for $ty {
                type Error = KvsError;

                fn try_from(value: &KvsValue) -> Result<Self> {
                    match value {
                        KvsValue::$variant(v) => Ok(v.clone()),
                        other => Err(other.mismatch(KvsValueKind::$variant)),
                    }
                }
            }
        )*
    };
}

impl_scalar_conversions! {
    bool => Boolean,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f64 => F64,
    String => String,
    Arc<KvsArray> => Array,
    Arc<KvsMap> => Object,
}

impl TryFrom<&KvsValue> for () {
    type Error = KvsError;

    fn try_from(value: &KvsValue) -> Result<Self> {
        match value {
            KvsValue::Null => Ok(()),
            other => Err(other.mismatch(KvsValueKind::Null)),
        }
    }
}

impl From<&str> for KvsValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<KvsArray> for KvsValue {
    fn from(v: KvsArray) -> Self {
        Self::Array(Arc::new(v))
    }
}

impl From<KvsMap> for KvsValue {
    fn from(v: KvsMap) -> Self {
        Self::Object(Arc::new(v))
    }
}

impl FromIterator<KvsValue> for KvsValue {
    fn from_iter<I: IntoIterator<Item = KvsValue>>(iter: I) -> Self {
        Self::Array(Arc::new(iter.into_iter().collect()))
    }
}

impl FromIterator<(String, KvsValue)> for KvsValue {
    fn from_iter<I: IntoIterator<Item = (String, KvsValue)>>(iter: I) -> Self {
        Self::Object(Arc::new(iter.into_iter().collect()))
    }
}
