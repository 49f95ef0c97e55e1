//! Leaf field model produced by the introspector.

use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Kind of a scalar leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    String,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int8 => "int8",
            ScalarKind::Int16 => "int16",
            ScalarKind::Int32 => "int32",
            ScalarKind::Int64 => "int64",
            ScalarKind::Uint8 => "uint8",
            ScalarKind::Uint16 => "uint16",
            ScalarKind::Uint32 => "uint32",
            ScalarKind::Uint64 => "uint64",
            ScalarKind::Float32 => "float32",
            ScalarKind::Float64 => "float64",
            ScalarKind::String => "string",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar leaf value.
///
/// Equality requires the same kind. Floats compare by bit pattern and NaN is
/// never equal to anything, so a NaN that stays NaN still counts as a change.
#[derive(Debug, Clone)]
pub enum Scalar {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::I8(_) => ScalarKind::Int8,
            Scalar::I16(_) => ScalarKind::Int16,
            Scalar::I32(_) => ScalarKind::Int32,
            Scalar::I64(_) => ScalarKind::Int64,
            Scalar::U8(_) => ScalarKind::Uint8,
            Scalar::U16(_) => ScalarKind::Uint16,
            Scalar::U32(_) => ScalarKind::Uint32,
            Scalar::U64(_) => ScalarKind::Uint64,
            Scalar::F32(_) => ScalarKind::Float32,
            Scalar::F64(_) => ScalarKind::Float64,
            Scalar::Str(_) => ScalarKind::String,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Signed view of any integer kind that fits in `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Scalar::I8(v) => Some(v.into()),
            Scalar::I16(v) => Some(v.into()),
            Scalar::I32(v) => Some(v.into()),
            Scalar::I64(v) => Some(v),
            Scalar::U8(v) => Some(v.into()),
            Scalar::U16(v) => Some(v.into()),
            Scalar::U32(v) => Some(v.into()),
            Scalar::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Unsigned view of any non-negative integer kind.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Scalar::U8(v) => Some(v.into()),
            Scalar::U16(v) => Some(v.into()),
            Scalar::U32(v) => Some(v.into()),
            Scalar::U64(v) => Some(v),
            _ => self.as_i64().and_then(|v| u64::try_from(v).ok()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Scalar::F32(v) => Some(v.into()),
            Scalar::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(v) => Some(v),
            _ => None,
        }
    }

    /// False only for NaN and infinite floats.
    pub fn is_finite(&self) -> bool {
        match *self {
            Scalar::F32(v) => v.is_finite(),
            Scalar::F64(v) => v.is_finite(),
            _ => true,
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::I8(a), Scalar::I8(b)) => a == b,
            (Scalar::I16(a), Scalar::I16(b)) => a == b,
            (Scalar::I32(a), Scalar::I32(b)) => a == b,
            (Scalar::I64(a), Scalar::I64(b)) => a == b,
            (Scalar::U8(a), Scalar::U8(b)) => a == b,
            (Scalar::U16(a), Scalar::U16(b)) => a == b,
            (Scalar::U32(a), Scalar::U32(b)) => a == b,
            (Scalar::U64(a), Scalar::U64(b)) => a == b,
            (Scalar::F32(a), Scalar::F32(b)) => !a.is_nan() && a.to_bits() == b.to_bits(),
            (Scalar::F64(a), Scalar::F64(b)) => !a.is_nan() && a.to_bits() == b.to_bits(),
            (Scalar::Str(a), Scalar::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{}", v),
            Scalar::I8(v) => write!(f, "{}", v),
            Scalar::I16(v) => write!(f, "{}", v),
            Scalar::I32(v) => write!(f, "{}", v),
            Scalar::I64(v) => write!(f, "{}", v),
            Scalar::U8(v) => write!(f, "{}", v),
            Scalar::U16(v) => write!(f, "{}", v),
            Scalar::U32(v) => write!(f, "{}", v),
            Scalar::U64(v) => write!(f, "{}", v),
            Scalar::F32(v) => write!(f, "{}", v),
            Scalar::F64(v) => write!(f, "{}", v),
            Scalar::Str(v) => write!(f, "{:?}", v),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Bool(v) => serializer.serialize_bool(*v),
            Scalar::I8(v) => serializer.serialize_i8(*v),
            Scalar::I16(v) => serializer.serialize_i16(*v),
            Scalar::I32(v) => serializer.serialize_i32(*v),
            Scalar::I64(v) => serializer.serialize_i64(*v),
            Scalar::U8(v) => serializer.serialize_u8(*v),
            Scalar::U16(v) => serializer.serialize_u16(*v),
            Scalar::U32(v) => serializer.serialize_u32(*v),
            Scalar::U64(v) => serializer.serialize_u64(*v),
            Scalar::F32(v) => serializer.serialize_f32(*v),
            Scalar::F64(v) => serializer.serialize_f64(*v),
            Scalar::Str(v) => serializer.serialize_str(v),
        }
    }
}

/// One scalar leaf of a configuration record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Dotted path of serialized field names from the root.
    pub path: String,
    /// Serialized name of the field itself.
    pub name: String,
    pub kind: ScalarKind,
    pub value: Scalar,
}

/// Flattened leaves of one record instance, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    fields: Vec<Field>,
}

impl Snapshot {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// Look up a leaf by path. The last field wins if a path repeats.
    pub fn get(&self, path: &str) -> Option<&Field> {
        self.fields.iter().rev().find(|f| f.path == path)
    }

    /// Index values by path, last write wins.
    pub fn index(&self) -> HashMap<&str, &Scalar> {
        self.fields
            .iter()
            .map(|f| (f.path.as_str(), &f.value))
            .collect()
    }

    /// First leaf holding a NaN or infinite float.
    pub fn first_non_finite(&self) -> Option<&Field> {
        self.fields.iter().find(|f| !f.value.is_finite())
    }

    pub fn into_vec(self) -> Vec<Field> {
        self.fields
    }
}

impl IntoIterator for Snapshot {
    type Item = Field;
    type IntoIter = std::vec::IntoIter<Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_equality_requires_same_kind() {
        assert_eq!(Scalar::I32(1), Scalar::I32(1));
        assert_ne!(Scalar::I32(1), Scalar::I64(1));
        assert_ne!(Scalar::U8(1), Scalar::I8(1));
        assert_ne!(Scalar::Str("1".into()), Scalar::I32(1));
    }

    #[test]
    fn test_float_equality_is_bitwise() {
        assert_eq!(Scalar::F32(1.1), Scalar::F32(1.1));
        assert_ne!(Scalar::F64(0.0), Scalar::F64(-0.0));
        assert_ne!(Scalar::F32(1.0), Scalar::F64(1.0));
    }

    #[test]
    fn test_nan_is_never_equal() {
        assert_ne!(Scalar::F64(f64::NAN), Scalar::F64(f64::NAN));
        assert_ne!(Scalar::F32(f32::NAN), Scalar::F32(f32::NAN));
    }

    #[test]
    fn test_non_finite_leaves_are_found() {
        assert!(Scalar::I32(1).is_finite());
        assert!(!Scalar::F32(f32::INFINITY).is_finite());

        let leaf = |path: &str, value: Scalar| Field {
            path: path.into(),
            name: path.into(),
            kind: value.kind(),
            value,
        };
        let snapshot = Snapshot::new(vec![
            leaf("ratio", Scalar::F64(0.5)),
            leaf("limit", Scalar::F64(f64::NAN)),
        ]);
        assert_eq!(snapshot.first_non_finite().map(|f| f.path.as_str()), Some("limit"));
        assert!(Snapshot::new(vec![leaf("ratio", Scalar::F64(0.5))])
            .first_non_finite()
            .is_none());
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(Scalar::U16(5432).as_i64(), Some(5432));
        assert_eq!(Scalar::I8(-1).as_u64(), None);
        assert_eq!(Scalar::U64(u64::MAX).as_i64(), None);
        assert_eq!(Scalar::F32(1.5).as_f64(), Some(1.5));
        assert_eq!(Scalar::Str("x".into()).as_str(), Some("x"));
        assert_eq!(Scalar::Bool(true).as_bool(), Some(true));
    }

    #[test]
    fn test_field_serializes_for_status_page() {
        let field = Field {
            path: "database.port".into(),
            name: "port".into(),
            kind: ScalarKind::Uint16,
            value: Scalar::U16(3306),
        };
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "path": "database.port",
                "name": "port",
                "kind": "uint16",
                "value": 3306,
            })
        );
    }

    #[test]
    fn test_snapshot_lookup_last_write_wins() {
        let snapshot = Snapshot::new(vec![
            Field {
                path: "a".into(),
                name: "a".into(),
                kind: ScalarKind::Int32,
                value: Scalar::I32(1),
            },
            Field {
                path: "a".into(),
                name: "a".into(),
                kind: ScalarKind::Int32,
                value: Scalar::I32(2),
            },
        ]);
        assert_eq!(snapshot.get("a").map(|f| &f.value), Some(&Scalar::I32(2)));
        assert_eq!(snapshot.index().get("a"), Some(&&Scalar::I32(2)));
        assert!(snapshot.get("b").is_none());
    }
}
