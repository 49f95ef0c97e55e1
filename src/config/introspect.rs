//! Record introspection.
//!
//! Flattens any `Serialize` struct into an ordered list of scalar leaves by
//! driving it through a collecting serializer. Nested structs recurse with a
//! dotted path prefix; containers, options, enums and other kinds that have no
//! single scalar value are skipped with a warning.

use serde::ser::{self, Impossible, Serialize};
use std::fmt::Display;

use crate::config::field::{Field, Scalar, Snapshot};
use crate::error::ConfigError;

/// Flatten a record into its scalar leaves.
pub fn flatten<T: Serialize + ?Sized>(value: &T) -> Result<Snapshot, ConfigError> {
    flatten_with_prefix(value, "")
}

/// Flatten a record, prepending `prefix` to every path.
pub fn flatten_with_prefix<T: Serialize + ?Sized>(
    value: &T,
    prefix: &str,
) -> Result<Snapshot, ConfigError> {
    let mut out = Vec::new();
    value
        .serialize(Root {
            out: &mut out,
            prefix,
        })
        .map_err(|e| match e {
            WalkError::Shape(kind) => ConfigError::Shape(kind),
            WalkError::Custom(msg) => ConfigError::Encode(msg),
        })?;
    Ok(Snapshot::new(out))
}

#[derive(Debug, thiserror::Error)]
enum WalkError {
    #[error("configuration must be a struct, got {0}")]
    Shape(String),
    #[error("{0}")]
    Custom(String),
}

impl ser::Error for WalkError {
    fn custom<T: Display>(msg: T) -> Self {
        WalkError::Custom(msg.to_string())
    }
}

fn not_a_record<T>(kind: &str) -> Result<T, WalkError> {
    Err(WalkError::Shape(kind.to_string()))
}

/// Entry point: accepts only a struct (possibly behind newtype wrappers).
struct Root<'a> {
    out: &'a mut Vec<Field>,
    prefix: &'a str,
}

impl<'a> ser::Serializer for Root<'a> {
    type Ok = ();
    type Error = WalkError;
    type SerializeSeq = Impossible<(), WalkError>;
    type SerializeTuple = Impossible<(), WalkError>;
    type SerializeTupleStruct = Impossible<(), WalkError>;
    type SerializeTupleVariant = Impossible<(), WalkError>;
    type SerializeMap = Impossible<(), WalkError>;
    type SerializeStruct = Record<'a>;
    type SerializeStructVariant = Impossible<(), WalkError>;

    fn serialize_bool(self, _: bool) -> Result<(), WalkError> {
        not_a_record("bool")
    }
    fn serialize_i8(self, _: i8) -> Result<(), WalkError> {
        not_a_record("int8")
    }
    fn serialize_i16(self, _: i16) -> Result<(), WalkError> {
        not_a_record("int16")
    }
    fn serialize_i32(self, _: i32) -> Result<(), WalkError> {
        not_a_record("int32")
    }
    fn serialize_i64(self, _: i64) -> Result<(), WalkError> {
        not_a_record("int64")
    }
    fn serialize_i128(self, _: i128) -> Result<(), WalkError> {
        not_a_record("int128")
    }
    fn serialize_u8(self, _: u8) -> Result<(), WalkError> {
        not_a_record("uint8")
    }
    fn serialize_u16(self, _: u16) -> Result<(), WalkError> {
        not_a_record("uint16")
    }
    fn serialize_u32(self, _: u32) -> Result<(), WalkError> {
        not_a_record("uint32")
    }
    fn serialize_u64(self, _: u64) -> Result<(), WalkError> {
        not_a_record("uint64")
    }
    fn serialize_u128(self, _: u128) -> Result<(), WalkError> {
        not_a_record("uint128")
    }
    fn serialize_f32(self, _: f32) -> Result<(), WalkError> {
        not_a_record("float32")
    }
    fn serialize_f64(self, _: f64) -> Result<(), WalkError> {
        not_a_record("float64")
    }
    fn serialize_char(self, _: char) -> Result<(), WalkError> {
        not_a_record("char")
    }
    fn serialize_str(self, _: &str) -> Result<(), WalkError> {
        not_a_record("string")
    }
    fn serialize_bytes(self, _: &[u8]) -> Result<(), WalkError> {
        not_a_record("bytes")
    }
    fn serialize_none(self) -> Result<(), WalkError> {
        not_a_record("option")
    }
    fn serialize_some<T: ?Sized + Serialize>(self, _: &T) -> Result<(), WalkError> {
        not_a_record("option")
    }
    fn serialize_unit(self) -> Result<(), WalkError> {
        not_a_record("unit")
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<(), WalkError> {
        not_a_record("unit struct")
    }
    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
    ) -> Result<(), WalkError> {
        not_a_record("enum")
    }
    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<(), WalkError> {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<(), WalkError> {
        not_a_record("enum")
    }
    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq, WalkError> {
        not_a_record("sequence")
    }
    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple, WalkError> {
        not_a_record("tuple")
    }
    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleStruct, WalkError> {
        not_a_record("tuple struct")
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleVariant, WalkError> {
        not_a_record("enum")
    }
    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap, WalkError> {
        not_a_record("map")
    }
    fn serialize_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStruct, WalkError> {
        Ok(Record {
            out: self.out,
            prefix: self.prefix.to_string(),
        })
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStructVariant, WalkError> {
        not_a_record("enum")
    }
}

/// Walks the fields of one struct level.
struct Record<'a> {
    out: &'a mut Vec<Field>,
    prefix: String,
}

impl ser::SerializeStruct for Record<'_> {
    type Ok = ();
    type Error = WalkError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), WalkError> {
        value.serialize(Leaf {
            out: &mut *self.out,
            prefix: &self.prefix,
            key,
        })
    }

    fn end(self) -> Result<(), WalkError> {
        Ok(())
    }
}

/// Serializes a single field value: records scalars, recurses into structs.
struct Leaf<'a> {
    out: &'a mut Vec<Field>,
    prefix: &'a str,
    key: &'static str,
}

impl Leaf<'_> {
    fn path(&self) -> String {
        format!("{}{}", self.prefix, self.key)
    }

    fn push(self, value: Scalar) -> Result<(), WalkError> {
        let path = self.path();
        self.out.push(Field {
            path,
            name: self.key.to_string(),
            kind: value.kind(),
            value,
        });
        Ok(())
    }

    fn skip(self, kind: &str) -> Result<Skip, WalkError> {
        tracing::warn!(path = %self.path(), kind, "Field type not supported, skipping");
        Ok(Skip)
    }
}

impl<'a> ser::Serializer for Leaf<'a> {
    type Ok = ();
    type Error = WalkError;
    type SerializeSeq = Skip;
    type SerializeTuple = Skip;
    type SerializeTupleStruct = Skip;
    type SerializeTupleVariant = Skip;
    type SerializeMap = Skip;
    type SerializeStruct = Record<'a>;
    type SerializeStructVariant = Skip;

    fn serialize_bool(self, v: bool) -> Result<(), WalkError> {
        self.push(Scalar::Bool(v))
    }
    fn serialize_i8(self, v: i8) -> Result<(), WalkError> {
        self.push(Scalar::I8(v))
    }
    fn serialize_i16(self, v: i16) -> Result<(), WalkError> {
        self.push(Scalar::I16(v))
    }
    fn serialize_i32(self, v: i32) -> Result<(), WalkError> {
        self.push(Scalar::I32(v))
    }
    fn serialize_i64(self, v: i64) -> Result<(), WalkError> {
        self.push(Scalar::I64(v))
    }
    fn serialize_i128(self, _: i128) -> Result<(), WalkError> {
        self.skip("int128").map(drop)
    }
    fn serialize_u8(self, v: u8) -> Result<(), WalkError> {
        self.push(Scalar::U8(v))
    }
    fn serialize_u16(self, v: u16) -> Result<(), WalkError> {
        self.push(Scalar::U16(v))
    }
    fn serialize_u32(self, v: u32) -> Result<(), WalkError> {
        self.push(Scalar::U32(v))
    }
    fn serialize_u64(self, v: u64) -> Result<(), WalkError> {
        self.push(Scalar::U64(v))
    }
    fn serialize_u128(self, _: u128) -> Result<(), WalkError> {
        self.skip("uint128").map(drop)
    }
    fn serialize_f32(self, v: f32) -> Result<(), WalkError> {
        self.push(Scalar::F32(v))
    }
    fn serialize_f64(self, v: f64) -> Result<(), WalkError> {
        self.push(Scalar::F64(v))
    }
    fn serialize_char(self, _: char) -> Result<(), WalkError> {
        self.skip("char").map(drop)
    }
    fn serialize_str(self, v: &str) -> Result<(), WalkError> {
        self.push(Scalar::Str(v.to_string()))
    }
    fn serialize_bytes(self, _: &[u8]) -> Result<(), WalkError> {
        self.skip("bytes").map(drop)
    }
    fn serialize_none(self) -> Result<(), WalkError> {
        self.skip("option").map(drop)
    }
    fn serialize_some<T: ?Sized + Serialize>(self, _: &T) -> Result<(), WalkError> {
        self.skip("option").map(drop)
    }
    fn serialize_unit(self) -> Result<(), WalkError> {
        self.skip("unit").map(drop)
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<(), WalkError> {
        self.skip("unit struct").map(drop)
    }
    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
    ) -> Result<(), WalkError> {
        self.skip("enum").map(drop)
    }
    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<(), WalkError> {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<(), WalkError> {
        self.skip("enum").map(drop)
    }
    fn serialize_seq(self, _: Option<usize>) -> Result<Skip, WalkError> {
        self.skip("sequence")
    }
    fn serialize_tuple(self, _: usize) -> Result<Skip, WalkError> {
        self.skip("tuple")
    }
    fn serialize_tuple_struct(self, _: &'static str, _: usize) -> Result<Skip, WalkError> {
        self.skip("tuple struct")
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Skip, WalkError> {
        self.skip("enum")
    }
    fn serialize_map(self, _: Option<usize>) -> Result<Skip, WalkError> {
        self.skip("map")
    }
    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Record<'a>, WalkError> {
        let prefix = format!("{}{}.", self.prefix, self.key);
        Ok(Record {
            out: self.out,
            prefix,
        })
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Skip, WalkError> {
        self.skip("enum")
    }
}

/// Swallows the contents of an unsupported field.
struct Skip;

impl ser::SerializeSeq for Skip {
    type Ok = ();
    type Error = WalkError;
    fn serialize_element<T: ?Sized + Serialize>(&mut self, _: &T) -> Result<(), WalkError> {
        Ok(())
    }
    fn end(self) -> Result<(), WalkError> {
        Ok(())
    }
}

impl ser::SerializeTuple for Skip {
    type Ok = ();
    type Error = WalkError;
    fn serialize_element<T: ?Sized + Serialize>(&mut self, _: &T) -> Result<(), WalkError> {
        Ok(())
    }
    fn end(self) -> Result<(), WalkError> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for Skip {
    type Ok = ();
    type Error = WalkError;
    fn serialize_field<T: ?Sized + Serialize>(&mut self, _: &T) -> Result<(), WalkError> {
        Ok(())
    }
    fn end(self) -> Result<(), WalkError> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for Skip {
    type Ok = ();
    type Error = WalkError;
    fn serialize_field<T: ?Sized + Serialize>(&mut self, _: &T) -> Result<(), WalkError> {
        Ok(())
    }
    fn end(self) -> Result<(), WalkError> {
        Ok(())
    }
}

impl ser::SerializeMap for Skip {
    type Ok = ();
    type Error = WalkError;
    fn serialize_key<T: ?Sized + Serialize>(&mut self, _: &T) -> Result<(), WalkError> {
        Ok(())
    }
    fn serialize_value<T: ?Sized + Serialize>(&mut self, _: &T) -> Result<(), WalkError> {
        Ok(())
    }
    fn end(self) -> Result<(), WalkError> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for Skip {
    type Ok = ();
    type Error = WalkError;
    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _: &'static str,
        _: &T,
    ) -> Result<(), WalkError> {
        Ok(())
    }
    fn end(self) -> Result<(), WalkError> {
        Ok(())
    }
}
