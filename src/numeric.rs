use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use strum_macros::Display;

/// Fractional digits kept by real division.
pub const DIVISION_SCALE: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Operator {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        match symbol {
            "+" => Some(Operator::Add),
            "-" => Some(Operator::Subtract),
            "*" => Some(Operator::Multiply),
            "/" => Some(Operator::Divide),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    DivideByZero,
    Overflow,
}

/// `-?(0|[1-9][0-9]*)`
pub fn is_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    valid_integral(digits)
}

/// `-?(0|[1-9][0-9]*)\.[0-9]+`
pub fn is_real(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let mut parts = unsigned.splitn(2, '.');
    let integral = parts.next().unwrap_or("");
    match parts.next() {
        Some(fraction) => {
            valid_integral(integral)
                && !fraction.is_empty()
                && fraction.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

fn valid_integral(digits: &str) -> bool {
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'))
}

pub fn integer(op: Operator, l: i64, r: i64) -> Result<i64, ArithmeticError> {
    let result = match op {
        Operator::Add => l.checked_add(r),
        Operator::Subtract => l.checked_sub(r),
        Operator::Multiply => l.checked_mul(r),
        Operator::Divide => {
            if r == 0 {
                return Err(ArithmeticError::DivideByZero);
            }
            l.checked_div(r)
        }
    };
    result.ok_or(ArithmeticError::Overflow)
}

/// Applies `op` in decimal arithmetic. Division keeps three fractional
/// digits, rounding half away from zero.
pub fn apply(op: Operator, l: Decimal, r: Decimal) -> Result<Decimal, ArithmeticError> {
    let result = match op {
        Operator::Add => l.checked_add(r),
        Operator::Subtract => l.checked_sub(r),
        Operator::Multiply => l.checked_mul(r),
        Operator::Divide => {
            if r.is_zero() {
                return Err(ArithmeticError::DivideByZero);
            }
            l.checked_div(r).map(|q| {
                q.round_dp_with_strategy(DIVISION_SCALE, RoundingStrategy::MidpointAwayFromZero)
            })
        }
    };
    result.ok_or(ArithmeticError::Overflow)
}

/// One decimal operation, reduced to single precision.
pub fn decimal(op: Operator, l: Decimal, r: Decimal) -> Result<f64, ArithmeticError> {
    apply(op, l, r).and_then(reduce)
}

/// The decimal a real's shortest text denotes, so `0.1` converts to exactly
/// `0.1`.
pub fn to_decimal(x: f64) -> Result<Decimal, ArithmeticError> {
    Decimal::from_str(&x.to_string())
        .ok()
        .or_else(|| Decimal::from_f64_retain(x))
        .ok_or(ArithmeticError::Overflow)
}

/// Narrows to `f32` and keeps the value its shortest decimal text denotes,
/// so `0.1 + 0.2` stores as exactly `0.3`.
pub fn reduce(d: Decimal) -> Result<f64, ArithmeticError> {
    let single = d.to_f32().ok_or(ArithmeticError::Overflow)?;
    if !single.is_finite() {
        return Err(ArithmeticError::Overflow);
    }
    Ok(single
        .to_string()
        .parse::<f64>()
        .unwrap_or_else(|_| f64::from(single)))
}

/// Prints a real the way a Java `double` prints: plain from 10^-3 up to
/// 10^7, computerized scientific notation (`2.0E7`, `5.0E-4`) outside that
/// range, and always with a fractional digit.
pub fn format_real(x: f64) -> String {
    if !x.is_finite() {
        return x.to_string();
    }
    let magnitude = x.abs();
    if magnitude != 0.0 && (magnitude < 1e-3 || magnitude >= 1e7) {
        let text = format!("{:e}", x);
        if let Some((mantissa, exponent)) = text.split_once('e') {
            return format!("{}E{}", with_fraction(mantissa), exponent);
        }
    }
    with_fraction(&x.to_string())
}

fn with_fraction(text: &str) -> String {
    if text.contains('.') {
        text.to_string()
    } else {
        format!("{}.0", text)
    }
}

#[cfg(test)]
mod numeric_tests {
    use crate::numeric::{self, ArithmeticError, Operator};
    use rust_decimal::Decimal;

    #[test]
    fn literal_patterns() {
        assert!(numeric::is_integer("0"));
        assert!(numeric::is_integer("-42"));
        assert!(!numeric::is_integer("007"));
        assert!(!numeric::is_integer("4.2"));
        assert!(!numeric::is_integer("abc"));
        assert!(!numeric::is_integer("-"));
        assert!(numeric::is_real("0.5"));
        assert!(numeric::is_real("-12.25"));
        assert!(!numeric::is_real("00.5"));
        assert!(!numeric::is_real("3."));
        assert!(!numeric::is_real("1.2.3"));
        assert!(!numeric::is_real("12"));
    }

    #[test]
    fn integer_division_truncates_toward_zero() {
        assert_eq!(numeric::integer(Operator::Divide, 7, 2), Ok(3));
        assert_eq!(numeric::integer(Operator::Divide, -7, 2), Ok(-3));
        assert_eq!(
            numeric::integer(Operator::Divide, 5, 0),
            Err(ArithmeticError::DivideByZero)
        );
        assert_eq!(
            numeric::integer(Operator::Add, i64::max_value(), 1),
            Err(ArithmeticError::Overflow)
        );
    }

    fn real(x: f64) -> Decimal {
        numeric::to_decimal(x).expect("real converts to decimal")
    }

    #[test]
    fn real_division_rounds_to_three_places_half_up() {
        assert_eq!(numeric::decimal(Operator::Divide, real(7.0), real(2.0)), Ok(3.5));
        assert_eq!(numeric::decimal(Operator::Divide, real(10.0), real(3.0)), Ok(3.333));
        assert_eq!(numeric::decimal(Operator::Divide, real(2.0), real(3.0)), Ok(0.667));
        assert_eq!(numeric::decimal(Operator::Divide, real(1.0), real(16.0)), Ok(0.063));
        assert_eq!(numeric::decimal(Operator::Divide, real(-1.0), real(16.0)), Ok(-0.063));
        assert_eq!(
            numeric::decimal(Operator::Divide, real(1.5), real(0.0)),
            Err(ArithmeticError::DivideByZero)
        );
    }

    #[test]
    fn results_are_reduced_to_single_precision() {
        assert_eq!(numeric::decimal(Operator::Add, real(0.1), real(0.2)), Ok(0.3));
        assert_eq!(numeric::decimal(Operator::Multiply, real(1.1), real(1.1)), Ok(1.21));
        assert_eq!(numeric::decimal(Operator::Subtract, real(1.0), real(0.9)), Ok(0.1));
        assert_eq!(numeric::decimal(Operator::Add, real(16777216.0), real(1.0)), Ok(16777216.0));
    }

    #[test]
    fn apply_keeps_full_precision_until_reduced() {
        let third = numeric::apply(Operator::Divide, Decimal::from(1), Decimal::from(3));
        assert_eq!(third.map(|d| d.to_string()), Ok("0.333".to_string()));
        let big = numeric::apply(
            Operator::Multiply,
            Decimal::from(1_000_000_000),
            Decimal::from(1_000_000_001),
        );
        assert_eq!(big.and_then(numeric::reduce), Ok(1e18));
    }

    #[test]
    fn conversion_uses_the_shortest_text() {
        assert_eq!(real(0.1).to_string(), "0.1");
        assert_eq!(real(123456789.0), Decimal::from(123456789));
        assert_eq!(real(0.1234567891).to_string(), "0.1234567891");
    }

    #[test]
    fn reals_print_with_fraction() {
        assert_eq!(numeric::format_real(3.0), "3.0");
        assert_eq!(numeric::format_real(-0.5), "-0.5");
        assert_eq!(numeric::format_real(3.333), "3.333");
        assert_eq!(numeric::format_real(0.0), "0.0");
        assert_eq!(numeric::format_real(0.001), "0.001");
        assert_eq!(numeric::format_real(9999999.0), "9999999.0");
    }

    #[test]
    fn large_and_small_reals_print_in_scientific_notation() {
        assert_eq!(numeric::format_real(1e7), "1.0E7");
        assert_eq!(numeric::format_real(2e7), "2.0E7");
        assert_eq!(numeric::format_real(-2e7), "-2.0E7");
        assert_eq!(numeric::format_real(5e-4), "5.0E-4");
        assert_eq!(numeric::format_real(123456789.0), "1.23456789E8");
        assert_eq!(numeric::format_real(16777216.0), "1.6777216E7");
    }

    #[test]
    fn operator_symbols() {
        assert_eq!(Operator::from_symbol("*"), Some(Operator::Multiply));
        assert_eq!(Operator::from_symbol("=="), None);
        assert_eq!(Operator::Divide.to_string(), "/");
    }
}
