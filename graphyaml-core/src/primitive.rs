//! Scalar values and their text forms.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::Error;

/// The primitive types a scalar can be read into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    String,
}

impl PrimitiveKind {
    /// Rust name of the kind.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::Char => "char",
            PrimitiveKind::String => "String",
        }
    }

    /// Whether values of this kind are written as text rather than numbers.
    pub fn is_textual(self) -> bool {
        matches!(self, PrimitiveKind::Char | PrimitiveKind::String)
    }
}

/// A primitive value.
///
/// Floats compare and hash by bit pattern, so `NaN == NaN` and `0.0 != -0.0`.
#[derive(Debug, Clone)]
pub enum Primitive {
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
    Char(char),
    String(String),
}

impl Primitive {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Bool(_) => PrimitiveKind::Bool,
            Primitive::I8(_) => PrimitiveKind::I8,
            Primitive::I16(_) => PrimitiveKind::I16,
            Primitive::I32(_) => PrimitiveKind::I32,
            Primitive::I64(_) => PrimitiveKind::I64,
            Primitive::U8(_) => PrimitiveKind::U8,
            Primitive::U16(_) => PrimitiveKind::U16,
            Primitive::U32(_) => PrimitiveKind::U32,
            Primitive::U64(_) => PrimitiveKind::U64,
            Primitive::F32(_) => PrimitiveKind::F32,
            Primitive::F64(_) => PrimitiveKind::F64,
            Primitive::Char(_) => PrimitiveKind::Char,
            Primitive::String(_) => PrimitiveKind::String,
        }
    }

    /// Integer value, for any integer kind.
    pub fn as_i128(&self) -> Option<i128> {
        Some(match *self {
            Primitive::I8(v) => v.into(),
            Primitive::I16(v) => v.into(),
            Primitive::I32(v) => v.into(),
            Primitive::I64(v) => v.into(),
            Primitive::U8(v) => v.into(),
            Primitive::U16(v) => v.into(),
            Primitive::U32(v) => v.into(),
            Primitive::U64(v) => v.into(),
            _ => return None,
        })
    }

    /// Float value, for any numeric kind.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Primitive::F32(v) => Some(v.into()),
            Primitive::F64(v) => Some(v),
            _ => self.as_i128().map(|v| v as f64),
        }
    }

    /// Text content, for the textual kinds.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Primitive::String(s) => Some(s.clone()),
            Primitive::Char(c) => Some(c.to_string()),
            _ => None,
        }
    }

    /// Parses `text` as exactly `kind`.
    ///
    /// Integers accept decimal, `0x` and `0o` forms and must fit the width.
    /// Floats accept the YAML specials (`.nan`, `.inf`, `-.inf`) as well as
    /// `NaN`, `Infinity` and `-Infinity`.
    pub fn parse(kind: PrimitiveKind, text: &str) -> Result<Primitive, Error> {
        let invalid = || Error::InvalidScalar {
            value: text.to_owned(),
            expected: kind.name().to_owned(),
        };
        macro_rules! int {
            ($variant:ident, $ty:ty) => {
                parse_integer(text)
                    .and_then(|v| <$ty>::try_from(v).ok())
                    .map(Primitive::$variant)
                    .ok_or_else(invalid)
            };
        }
        match kind {
            PrimitiveKind::Bool => parse_bool(text).map(Primitive::Bool).ok_or_else(invalid),
            PrimitiveKind::I8 => int!(I8, i8),
            PrimitiveKind::I16 => int!(I16, i16),
            PrimitiveKind::I32 => int!(I32, i32),
            PrimitiveKind::I64 => int!(I64, i64),
            PrimitiveKind::U8 => int!(U8, u8),
            PrimitiveKind::U16 => int!(U16, u16),
            PrimitiveKind::U32 => int!(U32, u32),
            PrimitiveKind::U64 => int!(U64, u64),
            PrimitiveKind::F32 => match special_float(text) {
                Some(v) if v.is_nan() => Ok(Primitive::F32(f32::NAN)),
                Some(v) => Ok(Primitive::F32(v as f32)),
                None => text.parse::<f32>().map(Primitive::F32).map_err(|_| invalid()),
            },
            PrimitiveKind::F64 => match special_float(text) {
                Some(v) => Ok(Primitive::F64(v)),
                None => text.parse::<f64>().map(Primitive::F64).map_err(|_| invalid()),
            },
            PrimitiveKind::Char => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Primitive::Char(c)),
                    _ => Err(invalid()),
                }
            }
            PrimitiveKind::String => Ok(Primitive::String(text.to_owned())),
        }
    }
}

/// `true`/`false` in the spellings YAML 1.2 accepts.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Decimal, `0x`, `0o` or `0b` integer, with optional sign on decimals.
pub fn parse_integer(text: &str) -> Option<i128> {
    let prefixed = [("0x", 16), ("0o", 8), ("0b", 2)]
        .into_iter()
        .find_map(|(prefix, radix)| Some((text.strip_prefix(prefix)?, radix)));
    if let Some((digits, radix)) = prefixed {
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return None;
        }
        return i128::from_str_radix(digits, radix).ok();
    }
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<i128>().ok()
}

/// `.nan`, `.inf` and friends.
pub fn special_float(text: &str) -> Option<f64> {
    match text {
        ".nan" | ".NaN" | ".NAN" | "NaN" => Some(f64::NAN),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" | "Infinity" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" | "-Infinity" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

/// Whether `text` matches the YAML 1.2 core float pattern (specials included).
pub fn is_float_literal(text: &str) -> bool {
    if special_float(text).is_some() && text.starts_with(['.', '-', '+']) {
        return true;
    }
    let body = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(at) => (&body[..at], Some(&body[at + 1..])),
        None => (body, None),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (mantissa, None),
    };
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let mantissa_ok = match frac_part {
        Some(f) => digits(int_part) && digits(f) && !(int_part.is_empty() && f.is_empty()),
        None => !int_part.is_empty() && digits(int_part),
    };
    let exponent_ok = match exponent {
        Some(e) => {
            let e = e.strip_prefix(['-', '+']).unwrap_or(e);
            !e.is_empty() && digits(e)
        }
        None => true,
    };
    mantissa_ok && exponent_ok && (frac_part.is_some() || exponent.is_some())
}

fn write_float(f: &mut fmt::Formatter<'_>, text: String, nan: bool, inf: Option<bool>) -> fmt::Result {
    if nan {
        return f.write_str(".nan");
    }
    match inf {
        Some(true) => return f.write_str(".inf"),
        Some(false) => return f.write_str("-.inf"),
        None => {}
    }
    f.write_str(&text)?;
    // keep floats recognizable as floats when read back untyped
    if text.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
        f.write_str(".0")?;
    }
    Ok(())
}

impl fmt::Display for Primitive {
    /// Shortest text that parses back to the same value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Bool(v) => write!(f, "{v}"),
            Primitive::I8(v) => write!(f, "{v}"),
            Primitive::I16(v) => write!(f, "{v}"),
            Primitive::I32(v) => write!(f, "{v}"),
            Primitive::I64(v) => write!(f, "{v}"),
            Primitive::U8(v) => write!(f, "{v}"),
            Primitive::U16(v) => write!(f, "{v}"),
            Primitive::U32(v) => write!(f, "{v}"),
            Primitive::U64(v) => write!(f, "{v}"),
            Primitive::F32(v) => write_float(
                f,
                v.to_string(),
                v.is_nan(),
                v.is_infinite().then_some(v.is_sign_positive()),
            ),
            Primitive::F64(v) => write_float(
                f,
                v.to_string(),
                v.is_nan(),
                v.is_infinite().then_some(v.is_sign_positive()),
            ),
            Primitive::Char(c) => write!(f, "{c}"),
            Primitive::String(s) => f.write_str(s),
        }
    }
}

impl PartialEq for Primitive {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Primitive::F32(a), Primitive::F32(b)) => a.to_bits() == b.to_bits(),
            (Primitive::F64(a), Primitive::F64(b)) => a.to_bits() == b.to_bits(),
            (Primitive::Bool(a), Primitive::Bool(b)) => a == b,
            (Primitive::Char(a), Primitive::Char(b)) => a == b,
            (Primitive::String(a), Primitive::String(b)) => a == b,
            (a, b) => match (a.as_i128(), b.as_i128()) {
                (Some(x), Some(y)) => a.kind() == b.kind() && x == y,
                _ => false,
            },
        }
    }
}

impl Eq for Primitive {}

impl Hash for Primitive {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Primitive::Bool(v) => v.hash(state),
            Primitive::F32(v) => v.to_bits().hash(state),
            Primitive::F64(v) => v.to_bits().hash(state),
            Primitive::Char(v) => v.hash(state),
            Primitive::String(v) => v.hash(state),
            other => other.as_i128().hash(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_print_back_bit_exact() {
        for v in [
            0.1f64,
            1.0 / 3.0,
            f64::MIN_POSITIVE,
            f64::MAX,
            -0.0,
            1e300,
            f64::NAN,
            f64::INFINITY,
            f64::NEG_INFINITY,
        ] {
            let text = Primitive::F64(v).to_string();
            let back = Primitive::parse(PrimitiveKind::F64, &text).unwrap();
            assert_eq!(back, Primitive::F64(v), "{text}");
        }
        for v in [0.1f32, f32::MAX, f32::MIN_POSITIVE, f32::NAN, f32::NEG_INFINITY] {
            let text = Primitive::F32(v).to_string();
            let back = Primitive::parse(PrimitiveKind::F32, &text).unwrap();
            assert_eq!(back, Primitive::F32(v), "{text}");
        }
    }

    #[test]
    fn whole_floats_keep_a_fraction() {
        assert_eq!(Primitive::F64(2.0).to_string(), "2.0");
        assert_eq!(Primitive::F32(-3.0).to_string(), "-3.0");
        assert_eq!(Primitive::F64(f64::NAN).to_string(), ".nan");
        assert_eq!(Primitive::F64(f64::NEG_INFINITY).to_string(), "-.inf");
    }

    #[test]
    fn integers_respect_width() {
        assert_eq!(
            Primitive::parse(PrimitiveKind::U8, "255").unwrap(),
            Primitive::U8(255)
        );
        assert!(Primitive::parse(PrimitiveKind::U8, "256").is_err());
        assert!(Primitive::parse(PrimitiveKind::U32, "-1").is_err());
        assert_eq!(
            Primitive::parse(PrimitiveKind::I16, "0x7f").unwrap(),
            Primitive::I16(127)
        );
        assert_eq!(
            Primitive::parse(PrimitiveKind::U64, "18446744073709551615").unwrap(),
            Primitive::U64(u64::MAX)
        );
    }

    #[test]
    fn prefixed_integers_use_their_radix() {
        assert_eq!(parse_integer("0x1F"), Some(31));
        assert_eq!(parse_integer("0o17"), Some(15));
        assert_eq!(parse_integer("0b1011"), Some(11));
        assert_eq!(parse_integer("0b"), None);
        assert_eq!(parse_integer("0b102"), None);
        assert_eq!(parse_integer("0x-5"), None);
        assert_eq!(
            Primitive::parse(PrimitiveKind::U8, "0b11111111").unwrap(),
            Primitive::U8(255)
        );
    }

    #[test]
    fn named_specials_are_accepted() {
        let nan = Primitive::parse(PrimitiveKind::F64, "NaN").unwrap();
        assert!(nan.as_f64().unwrap().is_nan());
        assert_eq!(
            Primitive::parse(PrimitiveKind::F32, "-Infinity").unwrap(),
            Primitive::F32(f32::NEG_INFINITY)
        );
    }

    #[test]
    fn float_literals() {
        for yes in ["1.5", "-2.0", ".5", "1e10", "1.5E-3", ".inf", "-.inf", ".nan"] {
            assert!(is_float_literal(yes), "{yes}");
        }
        for no in ["1", "abc", "1.2.3", "e5", ".", "NaN", "1e"] {
            assert!(!is_float_literal(no), "{no}");
        }
    }
}
