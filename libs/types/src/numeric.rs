//! Fixed-point decimal type for every monetary quantity
//!
//! `FixedPointValue` is a signed 128-bit integer read as `raw / 2^48`
//! (80 integer bits, 48 fraction bits), the same layout as the account
//! snapshots it is decoded from. Multiplication and division truncate toward
//! zero at 48-bit precision. Overflow is never wrapped or saturated: the
//! arithmetic operators panic, the `checked_*` variants return `None`.

use fixed::types::I80F48;
use rust_decimal::Decimal;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use crate::errors::NumericError;

/// Number of fractional bits.
pub const FRAC_BITS: u32 = 48;

const FRAC_MASK: u128 = (1u128 << FRAC_BITS) - 1;

/// Largest magnitude a non-negative raw value can hold.
const MAX_MAGNITUDE: u128 = i128::MAX as u128;

/// Significant digits `rust_decimal` can hold.
const DECIMAL_MAX_DIGITS: usize = 28;

/// Signed 80.48 binary fixed-point number.
///
/// Comparisons, `min` and `max` operate on the raw signed integer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FixedPointValue(I80F48);

impl FixedPointValue {
    pub const ZERO: Self = Self::from_bits(0);
    pub const ONE: Self = Self::from_bits(1 << FRAC_BITS);

    /// Build from the raw `raw / 2^48` representation.
    pub const fn from_bits(bits: i128) -> Self {
        Self(I80F48::from_bits(bits))
    }

    /// Raw signed representation.
    pub const fn to_bits(self) -> i128 {
        self.0.to_bits()
    }

    pub fn from_integer(value: i64) -> Self {
        Self::from_bits((value as i128) << FRAC_BITS)
    }

    /// Parse a decimal literal such as `"-12.5"` or `"0.000001"`.
    pub fn from_decimal_string(input: &str) -> Result<Self, NumericError> {
        input
            .trim()
            .parse::<I80F48>()
            .map(Self)
            .map_err(|e| NumericError::Parse {
                input: input.to_string(),
                reason: e.to_string(),
            })
    }

    /// Exact decimal expansion of the binary value, without trailing zeros.
    ///
    /// Every 48-bit fraction has a finite expansion of at most 48 digits.
    pub fn to_decimal_string(&self) -> String {
        let bits = self.to_bits();
        let magnitude = bits.unsigned_abs();
        let mut frac = magnitude & FRAC_MASK;

        let mut out = String::new();
        if bits < 0 {
            out.push('-');
        }
        out.push_str(&(magnitude >> FRAC_BITS).to_string());
        if frac != 0 {
            out.push('.');
            while frac != 0 {
                frac *= 10;
                out.push(char::from(b'0' + (frac >> FRAC_BITS) as u8));
                frac &= FRAC_MASK;
            }
        }
        out
    }

    /// Lossy conversion for display. Never feed the result back into
    /// monetary arithmetic.
    pub fn to_approximate_float(&self) -> f64 {
        self.0.to_num::<f64>()
    }

    /// Round HALF_UP to `dp` decimal places for reporting.
    ///
    /// `Decimal` holds 28 significant digits. When the integer part leaves
    /// fewer than `dp` fraction digits, rounding happens at the last digit
    /// that fits.
    pub fn to_decimal(&self, dp: u32) -> Result<Decimal, NumericError> {
        let exact = self.to_decimal_string();
        let unsigned = exact.trim_start_matches('-');
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));

        let budget = DECIMAL_MAX_DIGITS.saturating_sub(int_part.len());
        let scale = frac_part.len().min(dp as usize).min(budget);
        // At most 28 digits, well inside i128.
        let mut mantissa = int_part
            .bytes()
            .chain(frac_part.bytes().take(scale))
            .fold(0i128, |acc, digit| acc * 10 + i128::from(digit - b'0'));
        if frac_part.as_bytes().get(scale).is_some_and(|&digit| digit >= b'5') {
            mantissa += 1;
        }
        if self.is_negative() {
            mantissa = -mantissa;
        }

        Decimal::try_from_i128_with_scale(mantissa, scale as u32).map_err(|_| NumericError::DecimalRange {
            value: exact.clone(),
        })
    }

    /// `10^exp`. Negative exponents give the truncated reciprocal.
    ///
    /// # Panics
    /// Panics if `10^exp` exceeds the 80-bit integer range.
    pub fn pow10(exp: i32) -> Self {
        let magnitude = 10i64
            .checked_pow(exp.unsigned_abs())
            .map(Self::from_integer)
            .unwrap_or_else(|| overflow("pow10"));
        if exp >= 0 {
            magnitude
        } else {
            Self::ONE / magnitude
        }
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.to_bits().checked_add(rhs.to_bits()).map(Self::from_bits)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.to_bits().checked_sub(rhs.to_bits()).map(Self::from_bits)
    }

    /// Product truncated toward zero.
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        let (a, b) = (self.to_bits(), rhs.to_bits());
        let (hi, lo) = wide::mul(a.unsigned_abs(), b.unsigned_abs());
        // Drop the 48 fractional bits of the 96-fraction-bit product.
        if hi >> (FRAC_BITS - 1) != 0 {
            return None;
        }
        let magnitude = (hi << (128 - FRAC_BITS)) | (lo >> FRAC_BITS);
        with_sign(magnitude, (a < 0) != (b < 0))
    }

    /// Quotient truncated toward zero. `None` on division by zero.
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        let (a, b) = (self.to_bits(), rhs.to_bits());
        if b == 0 {
            return None;
        }
        let numerator = a.unsigned_abs();
        let magnitude = wide::div(
            numerator >> (128 - FRAC_BITS),
            numerator << FRAC_BITS,
            b.unsigned_abs(),
        )?;
        with_sign(magnitude, (a < 0) != (b < 0))
    }

    pub fn checked_neg(self) -> Option<Self> {
        self.to_bits().checked_neg().map(Self::from_bits)
    }

    pub fn abs(self) -> Self {
        self.to_bits()
            .checked_abs()
            .map(Self::from_bits)
            .unwrap_or_else(|| overflow("abs"))
    }

    pub fn is_zero(&self) -> bool {
        self.to_bits() == 0
    }

    pub fn is_positive(&self) -> bool {
        self.to_bits() > 0
    }

    pub fn is_negative(&self) -> bool {
        self.to_bits() < 0
    }

    /// Underlying `I80F48`, for embedders that already speak the `fixed` crate.
    pub fn into_inner(self) -> I80F48 {
        self.0
    }
}

fn with_sign(magnitude: u128, negative: bool) -> Option<FixedPointValue> {
    if magnitude > MAX_MAGNITUDE {
        return None;
    }
    let bits = magnitude as i128;
    Some(FixedPointValue::from_bits(if negative { -bits } else { bits }))
}

#[cold]
#[track_caller]
fn overflow(op: &str) -> ! {
    panic!("FixedPointValue overflow in {op}")
}

/// 256-bit intermediates for multiplication and division.
mod wide {
    const LOW_64: u128 = u64::MAX as u128;

    /// Full 256-bit product as `(hi, lo)`.
    pub(super) fn mul(a: u128, b: u128) -> (u128, u128) {
        let (a0, a1) = (a & LOW_64, a >> 64);
        let (b0, b1) = (b & LOW_64, b >> 64);

        let p00 = a0 * b0;
        let p01 = a0 * b1;
        let p10 = a1 * b0;
        let p11 = a1 * b1;

        let mid = (p00 >> 64) + (p01 & LOW_64) + (p10 & LOW_64);
        let lo = (p00 & LOW_64) | ((mid & LOW_64) << 64);
        let hi = p11 + (p01 >> 64) + (p10 >> 64) + (mid >> 64);
        (hi, lo)
    }

    /// `(hi, lo) / divisor`, or `None` if the quotient needs more than
    /// 128 bits. `divisor` must be non-zero and at most `2^127`.
    pub(super) fn div(hi: u128, lo: u128, divisor: u128) -> Option<u128> {
        if hi >= divisor {
            return None;
        }
        let mut rem = hi;
        let mut quotient = 0u128;
        for i in (0..128).rev() {
            rem = (rem << 1) | ((lo >> i) & 1);
            if rem >= divisor {
                rem -= divisor;
                quotient |= 1 << i;
            }
        }
        Some(quotient)
    }
}

impl Add for FixedPointValue {
    type Output = Self;

    #[track_caller]
    fn add(self, rhs: Self) -> Self {
        self.checked_add(rhs).unwrap_or_else(|| overflow("add"))
    }
}

impl Sub for FixedPointValue {
    type Output = Self;

    #[track_caller]
    fn sub(self, rhs: Self) -> Self {
        self.checked_sub(rhs).unwrap_or_else(|| overflow("sub"))
    }
}

impl Mul for FixedPointValue {
    type Output = Self;

    #[track_caller]
    fn mul(self, rhs: Self) -> Self {
        self.checked_mul(rhs).unwrap_or_else(|| overflow("mul"))
    }
}

impl Div for FixedPointValue {
    type Output = Self;

    /// # Panics
    /// Panics on division by zero or overflow.
    #[track_caller]
    fn div(self, rhs: Self) -> Self {
        self.checked_div(rhs).unwrap_or_else(|| overflow("div"))
    }
}

impl Neg for FixedPointValue {
    type Output = Self;

    #[track_caller]
    fn neg(self) -> Self {
        self.checked_neg().unwrap_or_else(|| overflow("neg"))
    }
}

impl AddAssign for FixedPointValue {
    #[track_caller]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for FixedPointValue {
    #[track_caller]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl std::iter::Sum for FixedPointValue {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, v| acc + v)
    }
}

impl From<i64> for FixedPointValue {
    fn from(value: i64) -> Self {
        Self::from_integer(value)
    }
}

impl From<I80F48> for FixedPointValue {
    fn from(value: I80F48) -> Self {
        Self(value)
    }
}

impl FromStr for FixedPointValue {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal_string(s)
    }
}

impl TryFrom<String> for FixedPointValue {
    type Error = NumericError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_decimal_string(&value)
    }
}

impl From<FixedPointValue> for String {
    fn from(value: FixedPointValue) -> Self {
        value.to_decimal_string()
    }
}

impl fmt::Display for FixedPointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

impl fmt::Debug for FixedPointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedPointValue({})", self.to_decimal_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(s: &str) -> FixedPointValue {
        FixedPointValue::from_decimal_string(s).unwrap()
    }

    #[test]
    fn test_from_integer_bits() {
        assert_eq!(FixedPointValue::from_integer(1).to_bits(), 1i128 << 48);
        assert_eq!(FixedPointValue::from_integer(-3).to_bits(), -3i128 << 48);
        assert_eq!(FixedPointValue::from_integer(0), FixedPointValue::ZERO);
    }

    #[test]
    fn test_basic_arithmetic() {
        let a = fp("2.5");
        let b = fp("0.5");
        assert_eq!(a + b, FixedPointValue::from_integer(3));
        assert_eq!(a - b, FixedPointValue::from_integer(2));
        assert_eq!(a * b, fp("1.25"));
        assert_eq!(a / b, FixedPointValue::from_integer(5));
        assert_eq!(-a, fp("-2.5"));
    }

    #[test]
    fn test_div_truncates_toward_zero() {
        let one = FixedPointValue::ONE;
        let three = FixedPointValue::from_integer(3);
        // 2^48 / 3 = 93824992236885.33.. → 93824992236885
        assert_eq!((one / three).to_bits(), 93_824_992_236_885);
        assert_eq!((-one / three).to_bits(), -93_824_992_236_885);
        assert_eq!((one / -three).to_bits(), -93_824_992_236_885);
    }

    #[test]
    fn test_mul_truncates_toward_zero() {
        let tiny = FixedPointValue::from_bits(1);
        let half = fp("0.5");
        assert_eq!((tiny * half).to_bits(), 0);
        assert_eq!((-tiny * half).to_bits(), 0);
    }

    #[test]
    fn test_mul_large_operands() {
        let a = FixedPointValue::from_integer(1_000_000_000_000);
        let b = FixedPointValue::from_integer(1_000_000);
        assert_eq!(a * b, fp("1000000000000000000"));
    }

    #[test]
    fn test_checked_ops_report_overflow() {
        let max = FixedPointValue::from_bits(i128::MAX);
        assert!(max.checked_add(FixedPointValue::from_bits(1)).is_none());
        assert!(max.checked_mul(FixedPointValue::from_integer(2)).is_none());
        assert!(FixedPointValue::ONE.checked_div(FixedPointValue::ZERO).is_none());
        assert!(max
            .checked_div(FixedPointValue::from_bits(1))
            .is_none());
    }

    #[test]
    #[should_panic(expected = "FixedPointValue overflow in mul")]
    fn test_overflow_is_fatal() {
        let big = FixedPointValue::from_integer(i64::MAX);
        let _ = big * big;
    }

    #[test]
    #[should_panic(expected = "FixedPointValue overflow in div")]
    fn test_division_by_zero_is_fatal() {
        let _ = FixedPointValue::ONE / FixedPointValue::ZERO;
    }

    #[test]
    fn test_to_decimal_string_exact() {
        assert_eq!(fp("1.5").to_decimal_string(), "1.5");
        assert_eq!(fp("-0.25").to_decimal_string(), "-0.25");
        assert_eq!(FixedPointValue::from_integer(42).to_decimal_string(), "42");
        assert_eq!(
            FixedPointValue::from_bits(1).to_decimal_string(),
            "0.000000000000003552713678800500929355621337890625"
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            FixedPointValue::from_decimal_string("12x"),
            Err(NumericError::Parse { .. })
        ));
    }

    #[test]
    fn test_min_max_compare_raw() {
        let a = fp("-1");
        let b = fp("0.75");
        assert_eq!(a.min(b), a);
        assert_eq!(a.max(b), b);
        assert!(a < b);
        assert_eq!(a.abs(), FixedPointValue::ONE);
    }

    #[test]
    fn test_pow10() {
        assert_eq!(FixedPointValue::pow10(0), FixedPointValue::ONE);
        assert_eq!(FixedPointValue::pow10(3), FixedPointValue::from_integer(1_000));
        assert_eq!(
            FixedPointValue::pow10(-2),
            FixedPointValue::ONE / FixedPointValue::from_integer(100)
        );
    }

    #[test]
    fn test_to_decimal_half_up() {
        assert_eq!(fp("1.125").to_decimal(2).unwrap(), Decimal::from_str("1.13").unwrap());
        assert_eq!(fp("-1.125").to_decimal(2).unwrap(), Decimal::from_str("-1.13").unwrap());
        assert_eq!(fp("7").to_decimal(8).unwrap(), Decimal::from(7));
        assert_eq!(fp("0.994").to_decimal(2).unwrap(), Decimal::from_str("0.99").unwrap());
        // 9 + 255/256: the carry ripples into the integer part
        assert_eq!(fp("9.99609375").to_decimal(2).unwrap(), Decimal::from(10));
    }

    #[test]
    fn test_to_decimal_rounds_where_digits_run_out() {
        // 24 integer digits leave room for 4 fraction digits
        let v = fp("123456789012345678901234.5678");
        assert_eq!(
            v.to_decimal(8).unwrap(),
            Decimal::from_str("123456789012345678901234.5678").unwrap()
        );
        assert_eq!(
            (-v).to_decimal(2).unwrap(),
            Decimal::from_str("-123456789012345678901234.57").unwrap()
        );
    }

    #[test]
    fn test_serde_uses_decimal_string() {
        let v = fp("-3.75");
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"-3.75\"");
        let back: FixedPointValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_approximate_float() {
        assert_eq!(fp("0.5").to_approximate_float(), 0.5);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_integer_arithmetic_is_exact(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
            let fa = FixedPointValue::from_integer(a);
            let fb = FixedPointValue::from_integer(b);
            prop_assert_eq!(fa + fb, FixedPointValue::from_integer(a + b));
            prop_assert_eq!(fa - fb, FixedPointValue::from_integer(a - b));
            prop_assert_eq!(fa * fb, FixedPointValue::from_integer(a * b));
        }

        #[test]
        fn prop_decimal_string_parses_back(bits in -(1i128 << 100)..(1i128 << 100)) {
            let v = FixedPointValue::from_bits(bits);
            let parsed = FixedPointValue::from_decimal_string(&v.to_decimal_string()).unwrap();
            prop_assert_eq!(parsed, v);
        }

        #[test]
        fn prop_mul_sign_symmetric(a in -(1i128 << 90)..(1i128 << 90), b in -(1i128 << 60)..(1i128 << 60)) {
            let fa = FixedPointValue::from_bits(a);
            let fb = FixedPointValue::from_bits(b);
            prop_assert_eq!(fa * fb, -((-fa) * fb));
            prop_assert_eq!(fa * fb, fb * fa);
        }
    }
}
