//! Canonical JSON serialization of token payloads.
//!
//! The output is compact JSON (`,` and `:` separators, no whitespace) with map
//! keys in insertion order. Strings are ASCII-only: anything outside the
//! printable ASCII range is written as a `\uXXXX` escape. Floats are written
//! with the shortest round-trip digits, in fixed notation for decimal
//! exponents in `[-4, 16)` and in signed scientific notation otherwise
//! (`1e+16`, `1.5e-05`). Together these rules make tokens byte-identical to
//! the ones produced by other implementations of the same format.
//!
//! NaN and infinite floats have no JSON form and are rejected.

use core::fmt;
use std::io;

use derive_more::{Display, Error};
use error_stack::Report;
use serde::ser::{
    self, SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant, SerializeTuple,
    SerializeTupleStruct, SerializeTupleVariant, Serializer,
};
use serde::Serialize;
use serde_json::ser::Formatter;

use crate::error::SigningError;

/// Serialize `value` to its canonical JSON text.
///
/// # Errors
///
/// Returns [`SigningError::Serialization`] if `value` cannot be represented
/// as JSON, e.g. a NaN or infinite float, a map whose keys are not strings,
/// or a `Serialize` implementation that fails.
pub fn to_canonical_string<T: Serialize + ?Sized>(
    value: &T,
) -> Result<String, Report<SigningError>> {
    // serde_json writes non-finite floats as `null`, so reject them up front.
    value.serialize(FiniteFloats).map_err(|e| {
        Report::new(SigningError::Serialization {
            message: e.to_string(),
        })
    })?;

    let mut buf = Vec::with_capacity(128);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, CanonicalFormatter);
    value.serialize(&mut serializer).map_err(|e| {
        Report::new(SigningError::Serialization {
            message: e.to_string(),
        })
    })?;

    String::from_utf8(buf).map_err(|_| {
        Report::new(SigningError::Serialization {
            message: "Serializer produced non UTF-8 output".into(),
        })
    })
}

#[derive(Debug, Display, Error)]
#[display("{message}")]
struct FloatCheckError {
    message: String,
}

impl ser::Error for FloatCheckError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self {
            message: msg.to_string(),
        }
    }
}

fn check_finite(value: f64) -> Result<(), FloatCheckError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FloatCheckError {
            message: format!("Cannot serialize non-finite float {value}"),
        })
    }
}

/// Serializer that produces nothing and fails on NaN or infinite floats.
#[derive(Debug, Clone, Copy)]
struct FiniteFloats;

macro_rules! accept_primitives {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method(self, _value: $ty) -> Result<(), FloatCheckError> {
                Ok(())
            }
        )*
    };
}

impl Serializer for FiniteFloats {
    type Ok = ();
    type Error = FloatCheckError;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    accept_primitives!(
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_i128(i128),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_u128(u128),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
        serialize_unit_struct(&'static str),
    );

    fn serialize_f32(self, value: f32) -> Result<(), FloatCheckError> {
        check_finite(f64::from(value))
    }

    fn serialize_f64(self, value: f64) -> Result<(), FloatCheckError> {
        check_finite(value)
    }

    fn serialize_none(self) -> Result<(), FloatCheckError> {
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<(), FloatCheckError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), FloatCheckError> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<(), FloatCheckError> {
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), FloatCheckError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<(), FloatCheckError> {
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self, FloatCheckError> {
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self, FloatCheckError> {
        Ok(self)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self, FloatCheckError> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, FloatCheckError> {
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self, FloatCheckError> {
        Ok(self)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self, FloatCheckError> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, FloatCheckError> {
        Ok(self)
    }
}

impl SerializeSeq for FiniteFloats {
    type Ok = ();
    type Error = FloatCheckError;

    fn serialize_element<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> Result<(), FloatCheckError> {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), FloatCheckError> {
        Ok(())
    }
}

impl SerializeTuple for FiniteFloats {
    type Ok = ();
    type Error = FloatCheckError;

    fn serialize_element<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> Result<(), FloatCheckError> {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), FloatCheckError> {
        Ok(())
    }
}

impl SerializeTupleStruct for FiniteFloats {
    type Ok = ();
    type Error = FloatCheckError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> Result<(), FloatCheckError> {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), FloatCheckError> {
        Ok(())
    }
}

impl SerializeTupleVariant for FiniteFloats {
    type Ok = ();
    type Error = FloatCheckError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> Result<(), FloatCheckError> {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), FloatCheckError> {
        Ok(())
    }
}

impl SerializeMap for FiniteFloats {
    type Ok = ();
    type Error = FloatCheckError;

    fn serialize_key<T: ?Sized + Serialize>(
        &mut self,
        key: &T,
    ) -> Result<(), FloatCheckError> {
        key.serialize(*self)
    }

    fn serialize_value<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> Result<(), FloatCheckError> {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), FloatCheckError> {
        Ok(())
    }
}

impl SerializeStruct for FiniteFloats {
    type Ok = ();
    type Error = FloatCheckError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), FloatCheckError> {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), FloatCheckError> {
        Ok(())
    }
}

impl SerializeStructVariant for FiniteFloats {
    type Ok = ();
    type Error = FloatCheckError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), FloatCheckError> {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), FloatCheckError> {
        Ok(())
    }
}

/// Compact formatter with ASCII-only strings and interoperable float output.
#[derive(Debug, Clone, Copy, Default)]
struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn write_f32<W>(&mut self, writer: &mut W, value: f32) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(format_float(&format!("{value:e}")).as_bytes())
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(format_float(&format!("{value:e}")).as_bytes())
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if ch.is_ascii() && ch != '\x7f' {
                continue;
            }
            writer.write_all(fragment[start..index].as_bytes())?;
            let mut units = [0_u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Reformat Rust's shortest scientific rendering (`1.5e-5`) into the
/// canonical float notation.
fn format_float(scientific: &str) -> String {
    let (negative, unsigned) = match scientific.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, scientific),
    };
    let (mantissa, exponent) = unsigned.split_once('e').unwrap_or((unsigned, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    let mut out = String::with_capacity(digits.len() + 8);
    if negative {
        out.push('-');
    }

    if (-4..16).contains(&exponent) {
        if exponent < 0 {
            out.push_str("0.");
            out.push_str(&"0".repeat(exponent.unsigned_abs() as usize - 1));
            out.push_str(&digits);
        } else {
            let point = exponent.unsigned_abs() as usize + 1;
            if digits.len() > point {
                out.push_str(&digits[..point]);
                out.push('.');
                out.push_str(&digits[point..]);
            } else {
                out.push_str(&digits);
                out.push_str(&"0".repeat(point - digits.len()));
                out.push_str(".0");
            }
        }
    } else {
        out.push_str(mantissa);
        out.push('e');
        out.push(if exponent < 0 { '-' } else { '+' });
        out.push_str(&format!("{:02}", exponent.unsigned_abs()));
    }

    out
}
