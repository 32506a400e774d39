//! Decimal physical quantities with a unit dimension.
//!
//! [`Quantity<D>`] stores a decimal magnitude in the base unit of its
//! dimension `D`: microliters for [`Volume`], nanomolar for [`Concentration`],
//! and a plain number for [`Ratio`]. Mixing dimensions is a compile error;
//! dividing two quantities of the same dimension yields a [`Ratio`], and any
//! quantity can be scaled by a ratio or a bare [`Decimal`].
//!
//! ## Undefined Values
//!
//! A quantity may be *undefined* (an unknown concentration, a volume that
//! depends on an unresolved mix). Undefined is an explicit tag rather than a
//! NaN, but it follows the same algebra: any arithmetic touching an undefined
//! operand yields undefined, and ordering comparisons against undefined are
//! `false`. Division by zero and decimal overflow also yield undefined.
//!
//! ```rust
//! use aliquot_core::{Concentration, Volume};
//!
//! let v: Volume = "5 uL".parse().unwrap();
//! let total: Volume = "20 µL".parse().unwrap();
//! let conc: Concentration = "1 uM".parse().unwrap();
//!
//! let dest = conc * (v / total);
//! assert_eq!(dest, "250 nM".parse().unwrap());
//!
//! let unknown = Volume::undefined();
//! assert!((v + unknown).is_undefined());
//! assert!(!(unknown < v));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::marker::PhantomData;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

/// A physical dimension with a base unit and a table of accepted unit symbols.
pub trait Dimension: Copy + Default + fmt::Debug + PartialEq + Eq + 'static {
    /// Human-readable dimension name, used in error messages.
    const NAME: &'static str;

    /// Whether a bare number (no unit symbol) is rejected when parsing.
    const REQUIRES_UNIT: bool = true;

    /// Multiplier converting a value in `symbol` into the base unit.
    fn scale(symbol: &str) -> Option<Decimal>;

    /// Unit symbol and converted magnitude used to print a base-unit value.
    fn display_unit(base: Decimal) -> (&'static str, Decimal);
}

/// Volume dimension. Base unit: microliter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolumeDim;

/// Molar concentration dimension. Base unit: nanomolar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConcentrationDim;

/// Dimensionless ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatioDim;

impl Dimension for VolumeDim {
    const NAME: &'static str = "volume";

    fn scale(symbol: &str) -> Option<Decimal> {
        match symbol {
            "nL" | "nl" => Some(Decimal::new(1, 3)),
            "uL" | "ul" | "µL" | "μL" | "µl" | "μl" => Some(Decimal::ONE),
            "mL" | "ml" => Some(Decimal::ONE_THOUSAND),
            "L" | "l" => Some(Decimal::from(1_000_000)),
            _ => None,
        }
    }

    fn display_unit(base: Decimal) -> (&'static str, Decimal) {
        let magnitude = base.abs();
        if magnitude >= Decimal::ONE_THOUSAND {
            ("mL", base / Decimal::ONE_THOUSAND)
        } else if magnitude >= Decimal::ONE || magnitude.is_zero() {
            ("µL", base)
        } else {
            ("nL", base * Decimal::ONE_THOUSAND)
        }
    }
}

impl Dimension for ConcentrationDim {
    const NAME: &'static str = "concentration";

    fn scale(symbol: &str) -> Option<Decimal> {
        match symbol {
            "pM" => Some(Decimal::new(1, 3)),
            "nM" => Some(Decimal::ONE),
            "uM" | "µM" | "μM" => Some(Decimal::ONE_THOUSAND),
            "mM" => Some(Decimal::from(1_000_000)),
            "M" => Some(Decimal::from(1_000_000_000)),
            _ => None,
        }
    }

    fn display_unit(base: Decimal) -> (&'static str, Decimal) {
        let magnitude = base.abs();
        let million = Decimal::from(1_000_000);
        if magnitude >= million {
            ("mM", base / million)
        } else if magnitude >= Decimal::ONE_THOUSAND {
            ("µM", base / Decimal::ONE_THOUSAND)
        } else if magnitude >= Decimal::ONE || magnitude.is_zero() {
            ("nM", base)
        } else {
            ("pM", base * Decimal::ONE_THOUSAND)
        }
    }
}

impl Dimension for RatioDim {
    const NAME: &'static str = "ratio";
    const REQUIRES_UNIT: bool = false;

    fn scale(symbol: &str) -> Option<Decimal> {
        match symbol {
            "" => Some(Decimal::ONE),
            "%" => Some(Decimal::new(1, 2)),
            _ => None,
        }
    }

    fn display_unit(base: Decimal) -> (&'static str, Decimal) {
        ("", base)
    }
}

/// A decimal quantity of dimension `D`, possibly undefined.
#[derive(Clone, Copy)]
pub struct Quantity<D: Dimension> {
    value: Option<Decimal>,
    _dimension: PhantomData<D>,
}

/// A liquid volume (base unit: µL).
pub type Volume = Quantity<VolumeDim>;

/// A molar concentration (base unit: nM).
pub type Concentration = Quantity<ConcentrationDim>;

/// A dimensionless ratio.
pub type Ratio = Quantity<RatioDim>;

impl<D: Dimension> Quantity<D> {
    /// The undefined quantity.
    pub const fn undefined() -> Self {
        Self {
            value: None,
            _dimension: PhantomData,
        }
    }

    /// Zero in the base unit.
    pub const fn zero() -> Self {
        Self::from_base(Decimal::ZERO)
    }

    /// Create a quantity from a magnitude already expressed in the base unit.
    pub const fn from_base(value: Decimal) -> Self {
        Self {
            value: Some(value),
            _dimension: PhantomData,
        }
    }

    /// Create a quantity from an optional base-unit magnitude.
    pub const fn from_base_option(value: Option<Decimal>) -> Self {
        Self {
            value,
            _dimension: PhantomData,
        }
    }

    /// Create a quantity from a magnitude in the given unit symbol.
    ///
    /// Returns `None` if the symbol is not a unit of this dimension.
    pub fn in_unit(value: Decimal, symbol: &str) -> Option<Self> {
        let scale = D::scale(symbol)?;
        Some(Self::from_base_option(value.checked_mul(scale)))
    }

    /// Magnitude in the base unit, or `None` if undefined.
    #[inline]
    pub fn base_value(&self) -> Option<Decimal> {
        self.value
    }

    /// Magnitude converted to the given unit symbol.
    pub fn value_in(&self, symbol: &str) -> Option<Decimal> {
        let scale = D::scale(symbol)?;
        self.value?.checked_div(scale)
    }

    /// Returns `true` if this quantity is undefined.
    #[inline]
    pub fn is_undefined(&self) -> bool {
        self.value.is_none()
    }

    /// Returns `true` if this quantity has a value.
    #[inline]
    pub fn is_defined(&self) -> bool {
        self.value.is_some()
    }

    /// Returns `true` for a defined zero.
    pub fn is_zero(&self) -> bool {
        self.value.is_some_and(|v| v.is_zero())
    }

    /// Returns `true` for a defined, strictly negative value.
    pub fn is_negative(&self) -> bool {
        self.value.is_some_and(|v| v < Decimal::ZERO)
    }

    /// Round to the nearest integer multiple of `quantum`.
    ///
    /// Ties round to the even multiple. Undefined if either side is undefined
    /// or `quantum` is zero.
    pub fn round_to_multiple(self, quantum: Self) -> Self {
        let steps = (self / quantum).value.map(|r| r.round());
        match steps {
            Some(steps) => quantum * steps,
            None => Self::undefined(),
        }
    }

    /// Returns `true` if this quantity is an exact integer multiple of `quantum`.
    pub fn is_multiple_of(&self, quantum: Self) -> bool {
        match (self.value, quantum.value) {
            (Some(v), Some(q)) if !q.is_zero() => v.checked_rem(q).is_some_and(|r| r.is_zero()),
            _ => false,
        }
    }

    /// Maximum of two quantities; undefined if either is undefined.
    pub fn max(self, other: Self) -> Self {
        match (self.value, other.value) {
            (Some(a), Some(b)) => Self::from_base(a.max(b)),
            _ => Self::undefined(),
        }
    }

    /// Minimum of two quantities; undefined if either is undefined.
    pub fn min(self, other: Self) -> Self {
        match (self.value, other.value) {
            (Some(a), Some(b)) => Self::from_base(a.min(b)),
            _ => Self::undefined(),
        }
    }

    fn zip_with(self, rhs: Self, op: impl FnOnce(Decimal, Decimal) -> Option<Decimal>) -> Self {
        match (self.value, rhs.value) {
            (Some(a), Some(b)) => Self::from_base_option(op(a, b)),
            _ => Self::undefined(),
        }
    }
}

impl Volume {
    /// Volume in microliters.
    pub fn microliters(value: impl Into<Decimal>) -> Self {
        Self::from_base(value.into())
    }

    /// Volume in nanoliters.
    pub fn nanoliters(value: impl Into<Decimal>) -> Self {
        Self::from_base_option(value.into().checked_div(Decimal::ONE_THOUSAND))
    }

    /// Magnitude in microliters.
    pub fn to_microliters(&self) -> Option<Decimal> {
        self.value
    }

    /// Magnitude in nanoliters.
    pub fn to_nanoliters(&self) -> Option<Decimal> {
        self.value?.checked_mul(Decimal::ONE_THOUSAND)
    }
}

impl Concentration {
    /// Concentration in nanomolar.
    pub fn nanomolar(value: impl Into<Decimal>) -> Self {
        Self::from_base(value.into())
    }

    /// Concentration in micromolar.
    pub fn micromolar(value: impl Into<Decimal>) -> Self {
        Self::from_base_option(value.into().checked_mul(Decimal::ONE_THOUSAND))
    }

    /// Magnitude in nanomolar.
    pub fn to_nanomolar(&self) -> Option<Decimal> {
        self.value
    }
}

impl Ratio {
    /// A dimensionless ratio.
    pub fn new(value: impl Into<Decimal>) -> Self {
        Self::from_base(value.into())
    }

    /// The ratio's value, or `None` if undefined.
    pub fn value(&self) -> Option<Decimal> {
        self.value
    }
}

impl<D: Dimension> Default for Quantity<D> {
    fn default() -> Self {
        Self::undefined()
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

impl<D: Dimension> Add for Quantity<D> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a.checked_add(b))
    }
}

impl<D: Dimension> Sub for Quantity<D> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a.checked_sub(b))
    }
}

impl<D: Dimension> Neg for Quantity<D> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_base_option(self.value.map(|v| -v))
    }
}

impl<D: Dimension> Mul<Decimal> for Quantity<D> {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self {
        Self::from_base_option(self.value.and_then(|v| v.checked_mul(rhs)))
    }
}

impl<D: Dimension> Div<Decimal> for Quantity<D> {
    type Output = Self;

    fn div(self, rhs: Decimal) -> Self {
        Self::from_base_option(self.value.and_then(|v| v.checked_div(rhs)))
    }
}

impl<D: Dimension> Mul<Ratio> for Quantity<D> {
    type Output = Self;

    fn mul(self, rhs: Ratio) -> Self {
        match rhs.value {
            Some(r) => self * r,
            None => Self::undefined(),
        }
    }
}

/// Same-dimension division yields a dimensionless ratio.
impl<D: Dimension> Div for Quantity<D> {
    type Output = Ratio;

    fn div(self, rhs: Self) -> Ratio {
        match (self.value, rhs.value) {
            (Some(a), Some(b)) => Ratio::from_base_option(a.checked_div(b)),
            _ => Ratio::undefined(),
        }
    }
}

impl<D: Dimension> Sum for Quantity<D> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, q| acc + q)
    }
}

impl<'a, D: Dimension> Sum<&'a Quantity<D>> for Quantity<D> {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, q| acc + *q)
    }
}

// =============================================================================
// Comparison
// =============================================================================

/// Two undefined quantities compare equal; undefined never equals a value.
impl<D: Dimension> PartialEq for Quantity<D> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Ordering against an undefined quantity is `None`, so `<`, `>`, `<=` and
/// `>=` are all `false`.
impl<D: Dimension> PartialOrd for Quantity<D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.value, other.value) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            (None, None) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

// =============================================================================
// Parsing and Display
// =============================================================================

/// Errors from parsing a quantity string such as `"5 uL"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityParseError {
    /// The numeric part could not be parsed as a decimal.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    /// The unit symbol does not belong to the expected dimension.
    #[error("unknown {dimension} unit '{unit}'")]
    UnknownUnit {
        /// The unrecognized unit symbol.
        unit: String,
        /// The dimension that was expected.
        dimension: &'static str,
    },

    /// A dimensioned quantity was given without a unit.
    #[error("missing {dimension} unit in '{input}'")]
    MissingUnit {
        /// The input string.
        input: String,
        /// The dimension that was expected.
        dimension: &'static str,
    },
}

/// Parses `"<number> <unit>"`, with or without the space.
///
/// `"undefined"` and `"nan"` (any case) parse to the undefined quantity.
/// Scientific notation (`"1e3 nM"`) is accepted.
impl<D: Dimension> FromStr for Quantity<D> {
    type Err = QuantityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("undefined") || s.eq_ignore_ascii_case("nan") {
            return Ok(Self::undefined());
        }

        let split = numeric_prefix_len(s);
        let (number, unit) = (s[..split].trim(), s[split..].trim());
        let value = Decimal::from_str(number)
            .or_else(|_| Decimal::from_scientific(number))
            .map_err(|_| QuantityParseError::InvalidNumber(number.to_string()))?;

        if unit.is_empty() && D::REQUIRES_UNIT {
            return Err(QuantityParseError::MissingUnit {
                input: s.to_string(),
                dimension: D::NAME,
            });
        }

        Self::in_unit(value, unit).ok_or_else(|| QuantityParseError::UnknownUnit {
            unit: unit.to_string(),
            dimension: D::NAME,
        })
    }
}

/// Length of the leading numeric part of `s`, exponent included.
fn numeric_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'-' | b'+')) {
        i += 1;
    }
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'-' | b'+')) {
            j += 1;
        }
        if bytes.get(j).is_some_and(u8::is_ascii_digit) {
            while bytes.get(j).is_some_and(u8::is_ascii_digit) {
                j += 1;
            }
            i = j;
        }
    }
    i
}

/// Prints in the most readable unit. A format precision (`{:.2}`) rounds to
/// that many decimal places; otherwise up to six places are shown.
impl<D: Dimension> fmt::Display for Quantity<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(value) = self.value else {
            return match D::display_unit(Decimal::ZERO).0 {
                "" => write!(f, "undefined"),
                symbol => write!(f, "undefined {symbol}"),
            };
        };
        let (symbol, magnitude) = D::display_unit(value);
        match f.precision() {
            Some(places) => {
                let rounded = magnitude.round_dp(u32::try_from(places).unwrap_or(u32::MAX));
                write!(f, "{rounded:.places$}")?;
            }
            None => write!(f, "{}", magnitude.round_dp(6).normalize())?,
        }
        if !symbol.is_empty() {
            write!(f, " {symbol}")?;
        }
        Ok(())
    }
}

impl<D: Dimension> fmt::Debug for Quantity<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({self})", D::NAME)
    }
}
