//! Numeric kinds and the coercion rules between them.
//!
//! Two operands of the same kind keep it. An integral operand meeting a
//! non-integral one takes the other's kind, and `int` meeting `long`
//! becomes `long`. Two different non-integral kinds meet at the
//! configured [`NumericPreference`].

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use reckon_syntax::BinOp;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{EvaluationError, Result};
use crate::options::NumericPreference;
use crate::value::Value;

/// A numeric value, split out of [`Value`] for arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Int,
    Long,
    Float,
    Double,
    Decimal,
}

impl Kind {
    fn is_integral(self) -> bool {
        matches!(self, Kind::Int | Kind::Long)
    }
}

/// Two operands converted to one common kind.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Pair {
    Int(i32, i32),
    Long(i64, i64),
    Float(f32, f32),
    Double(f64, f64),
    Decimal(Decimal, Decimal),
}

impl Number {
    pub fn from_value(value: &Value) -> Option<Number> {
        match value {
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Long(i) => Some(Number::Long(*i)),
            Value::Float(x) => Some(Number::Float(*x)),
            Value::Double(x) => Some(Number::Double(*x)),
            Value::Decimal(d) => Some(Number::Decimal(*d)),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Number::Int(i) => Value::Int(i),
            Number::Long(i) => Value::Long(i),
            Number::Float(x) => Value::Float(x),
            Number::Double(x) => Value::Double(x),
            Number::Decimal(d) => Value::Decimal(d),
        }
    }

    fn kind(self) -> Kind {
        match self {
            Number::Int(_) => Kind::Int,
            Number::Long(_) => Kind::Long,
            Number::Float(_) => Kind::Float,
            Number::Double(_) => Kind::Double,
            Number::Decimal(_) => Kind::Decimal,
        }
    }

    pub fn is_integral(self) -> bool {
        self.kind().is_integral()
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Long(i) => i == 0,
            Number::Float(x) => x == 0.0,
            Number::Double(x) => x == 0.0,
            Number::Decimal(d) => d.is_zero(),
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            Number::Int(i) => Some(i64::from(i)),
            Number::Long(i) => Some(i),
            _ => None,
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Number::Int(i) => f64::from(i),
            Number::Long(i) => i as f64,
            Number::Float(x) => f64::from(x),
            Number::Double(x) => x,
            Number::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
        }
    }

    pub fn to_decimal(self) -> Result<Decimal> {
        match self {
            Number::Int(i) => Ok(Decimal::from(i)),
            Number::Long(i) => Ok(Decimal::from(i)),
            Number::Float(x) => decimal_from_float(f64::from(x), &x.to_string()),
            Number::Double(x) => decimal_from_float(x, &x.to_string()),
            Number::Decimal(d) => Ok(d),
        }
    }

    fn convert(self, kind: Kind) -> Result<Number> {
        if self.kind() == kind {
            return Ok(self);
        }
        Ok(match kind {
            Kind::Int => self,
            Kind::Long => Number::Long(self.as_i64().unwrap_or_default()),
            Kind::Float => Number::Float(self.to_f64() as f32),
            Kind::Double => match self {
                // Go through the shortest text form so 0.1f32 stays 0.1.
                Number::Float(x) => Number::Double(x.to_string().parse().unwrap_or(f64::from(x))),
                other => Number::Double(other.to_f64()),
            },
            Kind::Decimal => Number::Decimal(self.to_decimal()?),
        })
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.into_value())
    }
}

/// Convert a float to a decimal through its shortest round-trip text, so
/// `1.8` becomes exactly `1.8` rather than its binary approximation.
fn decimal_from_float(x: f64, text: &str) -> Result<Decimal> {
    if !x.is_finite() {
        return Err(EvaluationError::Overflow(format!(
            "{} cannot be represented as a decimal",
            text
        )));
    }
    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_f64_retain(x))
        .ok_or_else(|| {
            EvaluationError::Overflow(format!("{} is out of range for a decimal", text))
        })
}

fn common_kind(a: Kind, b: Kind, preference: NumericPreference) -> Kind {
    match (a, b) {
        _ if a == b => a,
        (Kind::Int, Kind::Long) | (Kind::Long, Kind::Int) => Kind::Long,
        (integral, other) | (other, integral) if integral.is_integral() => other,
        _ => match preference {
            NumericPreference::Decimal => Kind::Decimal,
            NumericPreference::FloatingPoint => Kind::Double,
        },
    }
}

impl Pair {
    fn coerce(a: Number, b: Number, preference: NumericPreference) -> Result<Pair> {
        let kind = common_kind(a.kind(), b.kind(), preference);
        Ok(match (a.convert(kind)?, b.convert(kind)?) {
            (Number::Int(x), Number::Int(y)) => Pair::Int(x, y),
            (Number::Long(x), Number::Long(y)) => Pair::Long(x, y),
            (Number::Float(x), Number::Float(y)) => Pair::Float(x, y),
            (Number::Double(x), Number::Double(y)) => Pair::Double(x, y),
            (Number::Decimal(x), Number::Decimal(y)) => Pair::Decimal(x, y),
            (x, y) => {
                return Err(EvaluationError::type_error(format!(
                    "cannot combine {} and {}",
                    x, y
                )));
            }
        })
    }

    fn split(self) -> (Number, Number) {
        match self {
            Pair::Int(x, y) => (Number::Int(x), Number::Int(y)),
            Pair::Long(x, y) => (Number::Long(x), Number::Long(y)),
            Pair::Float(x, y) => (Number::Float(x), Number::Float(y)),
            Pair::Double(x, y) => (Number::Double(x), Number::Double(y)),
            Pair::Decimal(x, y) => (Number::Decimal(x), Number::Decimal(y)),
        }
    }
}

macro_rules! checked {
    ($op:expr, $x:expr, $y:expr) => {
        match $op {
            BinOp::Add => $x.checked_add($y),
            BinOp::Sub => $x.checked_sub($y),
            BinOp::Mul => $x.checked_mul($y),
            BinOp::Mod => $x.checked_rem($y),
            _ => None,
        }
    };
}

macro_rules! float_op {
    ($op:expr, $x:expr, $y:expr) => {
        match $op {
            BinOp::Add => $x + $y,
            BinOp::Sub => $x - $y,
            BinOp::Mul => $x * $y,
            _ => $x % $y,
        }
    };
}

/// `+ - * %` in the common kind of the operands. Like `/`, `%` rejects
/// any integral zero divisor.
pub(crate) fn arithmetic(
    op: BinOp,
    a: Number,
    b: Number,
    preference: NumericPreference,
) -> Result<Number> {
    if op == BinOp::Div {
        return divide(a, b, preference);
    }
    let overflow = || EvaluationError::Overflow(format!("{} {} {}", a, op.symbol(), b));
    let zero_divisor = op == BinOp::Mod && b.is_zero();
    if zero_divisor && b.is_integral() {
        return Err(EvaluationError::DivisionByZero);
    }

    Ok(match Pair::coerce(a, b, preference)? {
        Pair::Int(_, _) | Pair::Long(_, _) | Pair::Decimal(_, _) if zero_divisor => {
            return Err(EvaluationError::DivisionByZero);
        }
        Pair::Int(x, y) => Number::Int(checked!(op, x, y).ok_or_else(overflow)?),
        Pair::Long(x, y) => Number::Long(checked!(op, x, y).ok_or_else(overflow)?),
        Pair::Float(x, y) => Number::Float(float_op!(op, x, y)),
        Pair::Double(x, y) => Number::Double(float_op!(op, x, y)),
        Pair::Decimal(x, y) => Number::Decimal(checked!(op, x, y).ok_or_else(overflow)?),
    })
}

/// Division never truncates: two integral operands divide as `f64`.
/// An integral zero divisor is an error whatever the dividend.
pub(crate) fn divide(a: Number, b: Number, preference: NumericPreference) -> Result<Number> {
    if b.is_integral() && b.is_zero() {
        return Err(EvaluationError::DivisionByZero);
    }

    Ok(match Pair::coerce(a, b, preference)? {
        Pair::Int(x, y) => Number::Double(f64::from(x) / f64::from(y)),
        Pair::Long(x, y) => Number::Double(x as f64 / y as f64),
        Pair::Float(x, y) => Number::Float(x / y),
        Pair::Double(x, y) => Number::Double(x / y),
        Pair::Decimal(_, y) if y.is_zero() => return Err(EvaluationError::DivisionByZero),
        Pair::Decimal(x, y) => Number::Decimal(x.checked_div(y).ok_or_else(|| {
            EvaluationError::Overflow(format!("{} / {}", x, y))
        })?),
    })
}

/// Ordering in the common kind. `None` when either side is NaN.
pub(crate) fn compare(a: Number, b: Number, preference: NumericPreference) -> Option<Ordering> {
    match Pair::coerce(a, b, preference) {
        Ok(Pair::Int(x, y)) => Some(x.cmp(&y)),
        Ok(Pair::Long(x, y)) => Some(x.cmp(&y)),
        Ok(Pair::Float(x, y)) => x.partial_cmp(&y),
        Ok(Pair::Double(x, y)) => x.partial_cmp(&y),
        Ok(Pair::Decimal(x, y)) => Some(x.cmp(&y)),
        // Infinities and NaN have no decimal form.
        Err(_) => a.to_f64().partial_cmp(&b.to_f64()),
    }
}

/// The operand `keep` selects (`Greater` for the larger, `Less` for the
/// smaller), converted to the common kind. NaN compares as neither, so the
/// first operand wins.
pub(crate) fn pick(
    a: Number,
    b: Number,
    preference: NumericPreference,
    keep: Ordering,
) -> Result<Number> {
    let (x, y) = Pair::coerce(a, b, preference)?.split();
    Ok(match compare(x, y, preference) {
        Some(ordering) if ordering == keep.reverse() => y,
        _ => x,
    })
}

pub(crate) fn power(a: Number, b: Number) -> Number {
    Number::Double(a.to_f64().powf(b.to_f64()))
}

/// `& | ^` yield `int` only when both sides are `int`; shifts keep the
/// left operand's kind and use the low bits of the shift count.
pub(crate) fn bitwise(op: BinOp, a: Number, b: Number) -> Result<Number> {
    let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) else {
        return Err(EvaluationError::type_error(format!(
            "operator '{}' needs integral operands, got {} and {}",
            op.symbol(),
            a,
            b
        )));
    };

    let shifted = |narrow: bool| {
        let count = y as u32;
        match (op, narrow) {
            (BinOp::Shl, true) => Number::Int((x as i32).wrapping_shl(count)),
            (BinOp::Shl, false) => Number::Long(x.wrapping_shl(count)),
            (_, true) => Number::Int((x as i32).wrapping_shr(count)),
            (_, false) => Number::Long(x.wrapping_shr(count)),
        }
    };

    Ok(match op {
        BinOp::Shl | BinOp::Shr => shifted(matches!(a, Number::Int(_))),
        _ => {
            let bits = match op {
                BinOp::BitAnd => x & y,
                BinOp::BitOr => x | y,
                _ => x ^ y,
            };
            match (a, b) {
                (Number::Int(_), Number::Int(_)) => Number::Int(bits as i32),
                _ => Number::Long(bits),
            }
        }
    })
}

pub(crate) fn negate(n: Number) -> Result<Number> {
    let overflow = || EvaluationError::Overflow(format!("-({})", n));
    Ok(match n {
        Number::Int(i) => Number::Int(i.checked_neg().ok_or_else(overflow)?),
        Number::Long(i) => Number::Long(i.checked_neg().ok_or_else(overflow)?),
        Number::Float(x) => Number::Float(-x),
        Number::Double(x) => Number::Double(-x),
        Number::Decimal(d) => Number::Decimal(-d),
    })
}

pub(crate) fn bit_not(n: Number) -> Result<Number> {
    match n {
        Number::Int(i) => Ok(Number::Int(!i)),
        Number::Long(i) => Ok(Number::Long(!i)),
        other => Err(EvaluationError::type_error(format!(
            "operator '~' needs an integral operand, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const DEC: NumericPreference = NumericPreference::Decimal;

    #[test]
    fn same_kind_is_preserved() {
        let r = arithmetic(BinOp::Add, Number::Float(1.5), Number::Float(2.0), DEC);
        assert_eq!(r.ok(), Some(Number::Float(3.5)));
        let r = arithmetic(BinOp::Mul, Number::Int(6), Number::Int(7), DEC);
        assert_eq!(r.ok(), Some(Number::Int(42)));
    }

    #[test]
    fn integral_takes_the_other_kind() {
        let r = arithmetic(BinOp::Add, Number::Int(1), Number::Double(0.5), DEC);
        assert_eq!(r.ok(), Some(Number::Double(1.5)));
        let r = arithmetic(BinOp::Sub, Number::Long(10), Number::Int(3), DEC);
        assert_eq!(r.ok(), Some(Number::Long(7)));
        let r = arithmetic(BinOp::Mul, Number::Int(2), Number::Decimal(dec!(1.25)), DEC);
        assert_eq!(r.ok(), Some(Number::Decimal(dec!(2.5))));
    }

    #[test]
    fn mixed_floats_follow_preference() {
        let r = arithmetic(BinOp::Add, Number::Double(1.8), Number::Decimal(dec!(9.2)), DEC);
        assert_eq!(r.ok(), Some(Number::Decimal(dec!(11.0))));

        let r = arithmetic(
            BinOp::Add,
            Number::Float(0.5),
            Number::Decimal(dec!(0.25)),
            NumericPreference::FloatingPoint,
        );
        assert_eq!(r.ok(), Some(Number::Double(0.75)));
    }

    #[test]
    fn integer_division_is_fractional() {
        assert_eq!(divide(Number::Int(3), Number::Int(6), DEC).ok(), Some(Number::Double(0.5)));
        assert_eq!(divide(Number::Int(6), Number::Int(2), DEC).ok(), Some(Number::Double(3.0)));
    }

    #[test]
    fn zero_divisors() {
        assert!(matches!(
            divide(Number::Int(1), Number::Int(0), DEC),
            Err(EvaluationError::DivisionByZero)
        ));
        assert!(matches!(
            divide(Number::Decimal(dec!(1)), Number::Decimal(dec!(0)), DEC),
            Err(EvaluationError::DivisionByZero)
        ));
        assert!(matches!(
            arithmetic(BinOp::Mod, Number::Long(5), Number::Int(0), DEC),
            Err(EvaluationError::DivisionByZero)
        ));
        let r = divide(Number::Double(1.0), Number::Double(0.0), DEC);
        assert_eq!(r.ok(), Some(Number::Double(f64::INFINITY)));
    }

    #[test]
    fn overflow_is_reported() {
        assert!(matches!(
            arithmetic(BinOp::Add, Number::Int(i32::MAX), Number::Int(1), DEC),
            Err(EvaluationError::Overflow(_))
        ));
        assert!(matches!(negate(Number::Long(i64::MIN)), Err(EvaluationError::Overflow(_))));
    }

    #[test]
    fn float_to_decimal_uses_shortest_text() {
        assert_eq!(Number::Double(1.8).to_decimal().ok(), Some(dec!(1.8)));
        assert_eq!(Number::Float(0.1).to_decimal().ok(), Some(dec!(0.1)));
        assert!(Number::Double(f64::NAN).to_decimal().is_err());
    }

    #[test]
    fn bitwise_kinds() {
        assert_eq!(
            bitwise(BinOp::BitXor, Number::Int(5), Number::Int(3)).ok(),
            Some(Number::Int(6))
        );
        assert_eq!(
            bitwise(BinOp::BitAnd, Number::Int(6), Number::Long(3)).ok(),
            Some(Number::Long(2))
        );
        assert_eq!(
            bitwise(BinOp::Shl, Number::Int(1), Number::Long(4)).ok(),
            Some(Number::Int(16))
        );
        assert!(bitwise(BinOp::BitOr, Number::Double(1.0), Number::Int(1)).is_err());
        assert_eq!(bit_not(Number::Int(1)).ok(), Some(Number::Int(-2)));
    }

    #[test]
    fn compare_mixed_kinds() {
        assert_eq!(
            compare(Number::Int(2), Number::Decimal(dec!(2.0)), DEC),
            Some(Ordering::Equal)
        );
        assert_eq!(
            compare(Number::Double(f64::INFINITY), Number::Decimal(dec!(1)), DEC),
            Some(Ordering::Greater)
        );
        assert_eq!(compare(Number::Double(f64::NAN), Number::Int(1), DEC), None);
    }

    #[test]
    fn pick_returns_common_kind() {
        let larger = pick(Number::Int(3), Number::Double(2.5), DEC, Ordering::Greater);
        assert_eq!(larger.ok(), Some(Number::Double(3.0)));
        let smaller = pick(Number::Int(3), Number::Long(7), DEC, Ordering::Less);
        assert_eq!(smaller.ok(), Some(Number::Long(3)));
    }
}
