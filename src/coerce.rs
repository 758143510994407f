//! Turning literals into typed values.
//!
//! The `parse_*` helpers are pure. [`stage`] drives a [`Partial`] through a
//! field's shape and yields a fully built value ready to be moved into place.

use core::num::IntErrorKind;

use facet_core::{Characteristic, Def, KnownPointer, Shape, ShapeLayout, Type, UserType};
use facet_reflect::{HeapValue, Partial, ScalarType};

use crate::{
    DefaultsErrorKind,
    composite::{split_mapping, split_sequence, unquote},
};

/// Parses `true` or `false`, case-sensitively.
pub fn parse_bool(literal: &str) -> Result<bool, DefaultsErrorKind> {
    match literal {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(DefaultsErrorKind::UnparsableLiteral("`true` or `false`".into())),
    }
}

/// Parses a literal holding exactly one character.
pub fn parse_char(literal: &str) -> Result<char, DefaultsErrorKind> {
    let mut chars = literal.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(DefaultsErrorKind::UnparsableLiteral("a single character".into())),
    }
}

/// Parses a signed integer that must fit in `bits` bits.
///
/// Accepts an optional `+`/`-` sign followed by a `0x`, `0o`, `0b` or legacy
/// leading-`0` octal prefix. The sign applies to the parsed magnitude.
///
/// ```rust
/// use facet_defaults::parse_signed;
///
/// assert_eq!(parse_signed("-0x1a", 32).unwrap(), -26);
/// assert_eq!(parse_signed("012", 8).unwrap(), 10);
/// assert!(parse_signed("128", 8).is_err());
/// ```
pub fn parse_signed(literal: &str, bits: u32) -> Result<i128, DefaultsErrorKind> {
    let (negative, digits) = match literal.as_bytes().first() {
        Some(b'-') => (true, &literal[1..]),
        Some(b'+') => (false, &literal[1..]),
        _ => (false, literal),
    };
    let magnitude = parse_magnitude(digits, bits)?;
    // two's complement: one more on the negative side
    let limit = 1u128 << (bits - 1);
    if negative {
        if magnitude > limit {
            return Err(DefaultsErrorKind::Overflow { bits });
        }
        Ok(if magnitude == 1u128 << 127 {
            i128::MIN
        } else {
            -(magnitude as i128)
        })
    } else {
        if magnitude >= limit {
            return Err(DefaultsErrorKind::Overflow { bits });
        }
        Ok(magnitude as i128)
    }
}

/// Parses an unsigned integer that must fit in `bits` bits.
///
/// Same base prefixes as [`parse_signed`]; any sign is rejected.
pub fn parse_unsigned(literal: &str, bits: u32) -> Result<u128, DefaultsErrorKind> {
    if literal.starts_with(['+', '-']) {
        return Err(DefaultsErrorKind::UnparsableLiteral(
            "an unsigned integer without sign".into(),
        ));
    }
    let magnitude = parse_magnitude(literal, bits)?;
    if bits < 128 && magnitude >> bits != 0 {
        return Err(DefaultsErrorKind::Overflow { bits });
    }
    Ok(magnitude)
}

fn parse_magnitude(digits: &str, bits: u32) -> Result<u128, DefaultsErrorKind> {
    let (radix, body) = split_radix(digits);
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(DefaultsErrorKind::UnparsableLiteral(format!(
            "a base-{radix} integer"
        )));
    }
    u128::from_str_radix(body, radix).map_err(|err| match err.kind() {
        IntErrorKind::PosOverflow => DefaultsErrorKind::Overflow { bits },
        _ => DefaultsErrorKind::UnparsableLiteral(format!("a base-{radix} integer")),
    })
}

fn split_radix(digits: &str) -> (u32, &str) {
    let bytes = digits.as_bytes();
    match bytes {
        [b'0', b'x' | b'X', ..] => (16, &digits[2..]),
        [b'0', b'o' | b'O', ..] => (8, &digits[2..]),
        [b'0', b'b' | b'B', ..] => (2, &digits[2..]),
        [b'0', _, ..] => (8, &digits[1..]),
        _ => (10, digits),
    }
}

/// Parses a decimal or scientific literal into an `f32`.
pub fn parse_float32(literal: &str) -> Result<f32, DefaultsErrorKind> {
    let value: f32 = literal
        .parse()
        .map_err(|_| DefaultsErrorKind::UnparsableLiteral("a floating point number".into()))?;
    check_float_overflow(literal, value.is_infinite(), 32)?;
    Ok(value)
}

/// Parses a decimal or scientific literal into an `f64`.
pub fn parse_float64(literal: &str) -> Result<f64, DefaultsErrorKind> {
    let value: f64 = literal
        .parse()
        .map_err(|_| DefaultsErrorKind::UnparsableLiteral("a floating point number".into()))?;
    check_float_overflow(literal, value.is_infinite(), 64)?;
    Ok(value)
}

/// A finite literal that rounds to infinity overflowed; `inf` itself did not.
fn check_float_overflow(literal: &str, infinite: bool, bits: u32) -> Result<(), DefaultsErrorKind> {
    let unsigned = literal.trim_start_matches(['+', '-']);
    if infinite && !unsigned.to_ascii_lowercase().starts_with("inf") {
        return Err(DefaultsErrorKind::Overflow { bits });
    }
    Ok(())
}

/// Builds a value of `shape` from `literal`, without touching any existing value.
pub(crate) fn stage(
    shape: &'static Shape,
    literal: &str,
) -> Result<HeapValue<'static>, DefaultsErrorKind> {
    let mut partial = Partial::alloc_shape(shape)?;
    fill(&mut partial, literal)?;
    Ok(partial.build()?)
}

/// Builds `Some(Box::new(zero))` for an `Option<Box<R>>` shape.
pub(crate) fn stage_allocated_record(
    shape: &'static Shape,
) -> Result<HeapValue<'static>, DefaultsErrorKind> {
    let mut partial = Partial::alloc_shape(shape)?;
    partial.begin_some()?;
    partial.begin_smart_ptr()?;
    fill_zero(&mut partial)?;
    partial.end()?;
    partial.end()?;
    Ok(partial.build()?)
}

/// Fills the current frame of `partial` from `literal`.
pub(crate) fn fill(partial: &mut Partial<'static>, literal: &str) -> Result<(), DefaultsErrorKind> {
    let shape = partial.shape();
    log::trace!("Filling {shape} from {literal:?}");

    match shape.def {
        Def::Option(_) => {
            partial.begin_some()?;
            fill(partial, literal)?;
            partial.end()?;
            return Ok(());
        }
        Def::Pointer(ptr_def) => {
            if !matches!(ptr_def.known, Some(KnownPointer::Box)) {
                return Err(DefaultsErrorKind::UnsupportedTypeShape(shape.to_string()));
            }
            partial.begin_smart_ptr()?;
            fill(partial, literal)?;
            partial.end()?;
            return Ok(());
        }
        Def::List(_) => return fill_list(partial, literal),
        Def::Array(array_def) => return fill_array(partial, literal, array_def.n),
        Def::Map(_) => return fill_map(partial, literal),
        _ => {}
    }

    let Some(scalar) = ScalarType::try_from_shape(shape) else {
        return Err(DefaultsErrorKind::UnsupportedTypeShape(shape.to_string()));
    };
    match scalar {
        ScalarType::Bool => partial.set(parse_bool(literal)?),
        ScalarType::Char => partial.set(parse_char(literal)?),
        ScalarType::String => partial.set(literal.to_string()),
        ScalarType::F32 => partial.set(parse_float32(literal)?),
        ScalarType::F64 => partial.set(parse_float64(literal)?),
        ScalarType::U8 => partial.set(parse_unsigned(literal, u8::BITS)? as u8),
        ScalarType::U16 => partial.set(parse_unsigned(literal, u16::BITS)? as u16),
        ScalarType::U32 => partial.set(parse_unsigned(literal, u32::BITS)? as u32),
        ScalarType::U64 => partial.set(parse_unsigned(literal, u64::BITS)? as u64),
        ScalarType::U128 => partial.set(parse_unsigned(literal, u128::BITS)?),
        ScalarType::USize => partial.set(parse_unsigned(literal, usize::BITS)? as usize),
        ScalarType::I8 => partial.set(parse_signed(literal, i8::BITS)? as i8),
        ScalarType::I16 => partial.set(parse_signed(literal, i16::BITS)? as i16),
        ScalarType::I32 => partial.set(parse_signed(literal, i32::BITS)? as i32),
        ScalarType::I64 => partial.set(parse_signed(literal, i64::BITS)? as i64),
        ScalarType::I128 => partial.set(parse_signed(literal, i128::BITS)?),
        ScalarType::ISize => partial.set(parse_signed(literal, isize::BITS)? as isize),
        _ => return Err(DefaultsErrorKind::UnsupportedTypeShape(shape.to_string())),
    }?;
    Ok(())
}

fn fill_element(partial: &mut Partial<'static>, element: &str) -> Result<(), DefaultsErrorKind> {
    fill(partial, &unquote(element)?)
}

fn fill_list(partial: &mut Partial<'static>, literal: &str) -> Result<(), DefaultsErrorKind> {
    let elements = split_sequence(literal)?;
    partial.begin_list()?;
    for element in elements {
        partial.begin_list_item()?;
        fill_element(partial, element)?;
        partial.end()?;
    }
    Ok(())
}

fn fill_array(
    partial: &mut Partial<'static>,
    literal: &str,
    len: usize,
) -> Result<(), DefaultsErrorKind> {
    let elements = split_sequence(literal)?;
    if elements.len() > len {
        return Err(DefaultsErrorKind::TooManyElements {
            expected: len,
            found: elements.len(),
        });
    }
    for idx in 0..len {
        partial.begin_nth_element(idx)?;
        match elements.get(idx) {
            Some(element) => fill_element(partial, element)?,
            None => fill_zero(partial)?,
        }
        partial.end()?;
    }
    Ok(())
}

fn fill_map(partial: &mut Partial<'static>, literal: &str) -> Result<(), DefaultsErrorKind> {
    let entries = split_mapping(literal)?;
    partial.begin_map()?;
    for (key, value) in entries {
        partial.begin_key()?;
        fill_element(partial, key)?;
        partial.end()?;
        partial.begin_value()?;
        fill_element(partial, value)?;
        partial.end()?;
    }
    Ok(())
}

/// Sets the current frame to its type's zero value.
///
/// Structs and arrays without a `Default` impl are zeroed member by member.
pub(crate) fn fill_zero(partial: &mut Partial<'static>) -> Result<(), DefaultsErrorKind> {
    let shape = partial.shape();
    if shape.is(Characteristic::Default) {
        partial.set_default()?;
        return Ok(());
    }
    if let Def::Array(array_def) = shape.def {
        for idx in 0..array_def.n {
            partial.begin_nth_element(idx)?;
            fill_zero(partial)?;
            partial.end()?;
        }
        return Ok(());
    }
    let Type::User(UserType::Struct(struct_type)) = &shape.ty else {
        return Err(DefaultsErrorKind::UnsupportedTypeShape(shape.to_string()));
    };
    for idx in 0..struct_type.fields.len() {
        partial.begin_nth_field(idx)?;
        fill_zero(partial)?;
        partial.end()?;
    }
    Ok(())
}

/// Whether [`fill_zero`] can build a value of `shape`.
pub(crate) fn can_zero(shape: &'static Shape) -> bool {
    if shape.is(Characteristic::Default) {
        return true;
    }
    if let Def::Array(array_def) = shape.def {
        return can_zero(array_def.t);
    }
    match &shape.ty {
        Type::User(UserType::Struct(struct_type)) => struct_type
            .fields
            .iter()
            .all(|field| can_zero(field.shape)),
        _ => false,
    }
}

/// Byte size of a sized shape.
pub(crate) fn layout_size(shape: &'static Shape) -> Result<usize, DefaultsErrorKind> {
    match shape.layout {
        ShapeLayout::Sized(layout) => Ok(layout.size()),
        ShapeLayout::Unsized => Err(DefaultsErrorKind::UnsupportedTypeShape(shape.to_string())),
    }
}
