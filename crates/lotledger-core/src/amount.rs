//! Amount type representing an exact quantity of an asset.
//!
//! An [`Amount`] pairs an exact rational number with an [`Asset`] code. All
//! arithmetic is exact; rounding only happens when an amount is rendered, or
//! explicitly through [`Amount::rounded`].
//!
//! How many decimal places an asset renders with is learned from the input:
//! the [`Precision`] registry remembers the widest fractional part seen for
//! each asset, never going below [`DEFAULT_PRECISION`].

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::error::ParseError;
use crate::Asset;

/// Decimal places used for an asset until input shows it needs more.
pub const DEFAULT_PRECISION: usize = 6;

/// Display precision learned per asset.
///
/// Precision only ever increases: once a journal shows `0.00000001 BTC`, BTC
/// renders with eight places for the rest of the run.
///
/// ```
/// use lotledger_core::{Amount, Precision};
///
/// let mut precision = Precision::new();
/// assert_eq!(precision.places("BTC"), 6);
///
/// Amount::parse("0.00000001 BTC", &mut precision).unwrap();
/// assert_eq!(precision.places("BTC"), 8);
///
/// Amount::parse("1.5 BTC", &mut precision).unwrap();
/// assert_eq!(precision.places("BTC"), 8);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Precision {
    places: HashMap<Asset, usize>,
}

impl Precision {
    /// Create a registry where every asset uses [`DEFAULT_PRECISION`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decimal places to render `asset` with.
    pub fn places(&self, asset: &str) -> usize {
        self.places.get(asset).copied().unwrap_or(DEFAULT_PRECISION)
    }

    /// Record that `digits` fractional digits were seen for `asset`.
    pub fn observe(&mut self, asset: &Asset, digits: usize) {
        if digits > self.places(asset) {
            self.places.insert(asset.clone(), digits);
        }
    }
}

/// An amount is an exact quantity paired with an asset code.
///
/// # Examples
///
/// ```
/// use lotledger_core::Amount;
///
/// let amount: Amount = "100.25 USD".parse().unwrap();
/// assert_eq!(amount.asset, "USD");
///
/// let other: Amount = "0.75 USD".parse().unwrap();
/// let sum = &amount + &other;
/// assert_eq!(sum.to_string(), "101 USD");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    /// The exact quantity
    pub number: BigRational,
    /// The asset code (e.g., "USD", "BTC")
    pub asset: Asset,
}

impl Amount {
    /// Create a new amount.
    #[must_use]
    pub fn new(number: BigRational, asset: impl Into<Asset>) -> Self {
        Self {
            number,
            asset: asset.into(),
        }
    }

    /// Create an amount holding a whole number.
    #[must_use]
    pub fn from_integer(number: i64, asset: impl Into<Asset>) -> Self {
        Self::new(BigRational::from_integer(BigInt::from(number)), asset)
    }

    /// Create a zero amount of the given asset.
    #[must_use]
    pub fn zero(asset: impl Into<Asset>) -> Self {
        Self::new(BigRational::zero(), asset)
    }

    /// A zero amount of the same asset.
    #[must_use]
    pub fn zero_clone(&self) -> Self {
        Self::zero(self.asset.clone())
    }

    /// The absolute value of this amount.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self::new(self.number.abs(), self.asset.clone())
    }

    /// Parse `"<number> <asset>"`, recording the number's decimal places.
    ///
    /// Only literal numbers are accepted (`1`, `-2.50`, `.5`, `3/4`); ledger
    /// expressions such as `(1 + 2) USD` are rejected.
    pub fn parse(text: &str, precision: &mut Precision) -> Result<Self, ParseError> {
        let (amount, digits) = parse_amount(text)?;
        precision.observe(&amount.asset, digits);
        Ok(amount)
    }

    /// Check if both amounts are of the same asset.
    #[must_use]
    pub fn compatible(&self, other: &Self) -> bool {
        self.asset == other.asset
    }

    /// Check if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.number.is_zero()
    }

    /// Check if the amount is greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.number.is_positive()
    }

    /// Check if the amount is less than zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.number.is_negative()
    }

    /// The number rounded to `places` decimal places, halves away from zero.
    #[must_use]
    pub fn round(&self, places: usize) -> BigRational {
        let scale = BigRational::from_integer(num_traits::pow(BigInt::from(10), places));
        (&self.number * &scale).round() / scale
    }

    /// This amount rounded to its asset's display precision.
    ///
    /// The result equals what a reader sees in the rendered journal, which
    /// is what gain arithmetic sums.
    #[must_use]
    pub fn rounded(&self, precision: &Precision) -> Self {
        Self::new(self.round(precision.places(&self.asset)), self.asset.clone())
    }

    /// The number with exactly `places` decimal places, untrimmed.
    #[must_use]
    pub fn to_decimal_string(&self, places: usize) -> String {
        let scale = BigRational::from_integer(num_traits::pow(BigInt::from(10), places));
        let scaled = (&self.number * scale).round().to_integer();
        let mut digits = scaled.abs().to_string();
        if places > 0 {
            if digits.len() <= places {
                digits.insert_str(0, &"0".repeat(places + 1 - digits.len()));
            }
            digits.insert(digits.len() - places, '.');
        }
        if scaled.is_negative() {
            digits.insert(0, '-');
        }
        digits
    }

    /// Render for the journal at the asset's learned precision.
    #[must_use]
    pub fn display<'a>(&'a self, precision: &Precision) -> AmountDisplay<'a> {
        AmountDisplay {
            amount: self,
            places: precision.places(&self.asset),
        }
    }

    /// Render without the separating space, e.g. `10BTC`, as used in lot names.
    #[must_use]
    pub fn compact(&self, precision: &Precision) -> String {
        let places = precision.places(&self.asset);
        format!("{}{}", trim_fraction(self.to_decimal_string(places)), self.asset)
    }
}

/// Journal rendering of an [`Amount`] at a fixed number of places.
///
/// Trailing zero digits and a bare trailing decimal point are dropped.
#[derive(Debug, Clone, Copy)]
pub struct AmountDisplay<'a> {
    amount: &'a Amount,
    places: usize,
}

impl fmt::Display for AmountDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let number = trim_fraction(self.amount.to_decimal_string(self.places));
        write!(f, "{} {}", number, self.amount.asset)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        AmountDisplay {
            amount: self,
            places: DEFAULT_PRECISION,
        }
        .fmt(f)
    }
}

impl FromStr for Amount {
    type Err = ParseError;

    /// Parse without recording precision.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_amount(s).map(|(amount, _)| amount)
    }
}

fn trim_fraction(mut number: String) -> String {
    if number.contains('.') {
        let trimmed = number.trim_end_matches('0').trim_end_matches('.').len();
        number.truncate(trimmed);
    }
    if number == "-0" {
        number.remove(0);
    }
    number
}

/// Parse `"<number> <asset>"`, returning the amount and its decimal places.
fn parse_amount(text: &str) -> Result<(Amount, usize), ParseError> {
    let mut tokens = text.split_whitespace();
    let (Some(number), Some(asset)) = (tokens.next(), tokens.next()) else {
        return Err(ParseError::MissingAsset {
            input: text.to_string(),
        });
    };
    if tokens.next().is_some() {
        return Err(ParseError::TrailingText {
            input: text.to_string(),
        });
    }
    let (number, digits) = parse_number(number).ok_or_else(|| ParseError::InvalidNumber {
        input: text.to_string(),
    })?;
    Ok((Amount::new(number, asset), digits))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_number(text: &str) -> Option<(BigRational, usize)> {
    let (negative, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let (value, digits) = if let Some((numer, denom)) = body.split_once('/') {
        if !is_digits(numer) || !is_digits(denom) {
            return None;
        }
        let denom: BigInt = denom.parse().ok()?;
        if denom.is_zero() {
            return None;
        }
        (BigRational::new(numer.parse().ok()?, denom), 0)
    } else {
        let (whole, fraction) = body.split_once('.').unwrap_or((body, ""));
        let whole_ok = whole.is_empty() || is_digits(whole);
        let fraction_ok = fraction.is_empty() || is_digits(fraction);
        if !whole_ok || !fraction_ok || (whole.is_empty() && fraction.is_empty()) {
            return None;
        }
        let numer: BigInt = format!("{whole}{fraction}").parse().ok()?;
        let denom = num_traits::pow(BigInt::from(10), fraction.len());
        (BigRational::new(numer, denom), fraction.len())
    };

    Some((if negative { -value } else { value }, digits))
}

// Arithmetic operations on references

impl Add for &Amount {
    type Output = Amount;

    fn add(self, other: &Amount) -> Amount {
        debug_assert_eq!(
            self.asset, other.asset,
            "Cannot add amounts with different assets"
        );
        Amount {
            number: &self.number + &other.number,
            asset: self.asset.clone(),
        }
    }
}

impl Sub for &Amount {
    type Output = Amount;

    fn sub(self, other: &Amount) -> Amount {
        debug_assert_eq!(
            self.asset, other.asset,
            "Cannot subtract amounts with different assets"
        );
        Amount {
            number: &self.number - &other.number,
            asset: self.asset.clone(),
        }
    }
}

impl Neg for &Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        Amount {
            number: -&self.number,
            asset: self.asset.clone(),
        }
    }
}

// Arithmetic operations on owned values

impl Add for Amount {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        &self + &other
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        &self - &other
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            number: -self.number,
            asset: self.asset,
        }
    }
}

impl AddAssign<&Self> for Amount {
    fn add_assign(&mut self, other: &Self) {
        debug_assert_eq!(
            self.asset, other.asset,
            "Cannot add amounts with different assets"
        );
        self.number += &other.number;
    }
}

impl SubAssign<&Self> for Amount {
    fn sub_assign(&mut self, other: &Self) {
        debug_assert_eq!(
            self.asset, other.asset,
            "Cannot subtract amounts with different assets"
        );
        self.number -= &other.number;
    }
}
