//! Literal values embedded in the tree.
//! 语法树中的字面量。

use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// A constant written directly in the expression text, or placed in a
/// hand-built tree.
/// 表达式中直接书写的常量。
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// 32-bit integer / 32 位整数
    Int(i32),
    /// 64-bit integer, for integer literals that do not fit in 32 bits
    /// 64 位整数
    Long(i64),
    /// 32-bit float / 32 位浮点数
    Float(f32),
    /// 64-bit float / 64 位浮点数
    Double(f64),
    /// Fixed-point decimal / 定点小数
    Decimal(Decimal),
    /// Boolean / 布尔值
    Bool(bool),
    /// Text / 文本
    Text(String),
    /// Date and time / 日期时间
    DateTime(NaiveDateTime),
}

impl Literal {
    /// The narrowest integer literal for `value`.
    pub fn integer(value: i64) -> Self {
        match i32::try_from(value) {
            Ok(small) => Literal::Int(small),
            Err(_) => Literal::Long(value),
        }
    }
}

fn write_text(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("'")?;
    for ch in text.chars() {
        match ch {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("'")
}

/// Writes the literal back as expression source.
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Long(i) => write!(f, "{}", i),
            // Debug keeps a decimal point or exponent, so the text lexes as a float.
            Literal::Float(x) => write!(f, "{:?}", x),
            Literal::Double(x) => write!(f, "{:?}", x),
            Literal::Decimal(d) => write!(f, "{}", d),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Text(s) => write_text(f, s),
            Literal::DateTime(dt) => write!(f, "#{}#", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

macro_rules! literal_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Literal {
                fn from(value: $ty) -> Self {
                    Literal::$variant(value.into())
                }
            }
        )*
    };
}

literal_from! {
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    Decimal => Decimal,
    bool => Bool,
    String => Text,
    &str => Text,
    NaiveDateTime => DateTime,
}
