// qfixed - A crate for signed Q(m.n) fixed point values.
//
// Values carry their format at runtime, parsed from descriptors such as
// "Q4.8", and every operation either preserves that format or derives a
// widened one.
//
// There is optional support for `serde` serialization and deserialization.
//
#![deny(clippy::all, clippy::cargo)]
#![doc(html_playground_url = "https://play.rust-lang.org/")]

//! Signed fixed point arithmetic in Q(m.n) format.
//!
//! This crate provides a `Copy` value type backed by a 64 bit scaled
//! integer. A value is constructed from a real number and a format
//! descriptor; the descriptor declares the integer bit width (sign
//! included) and the fractional bit width, which together bound the
//! representable range and the resolution.
//!
//! Construction validates the value against the declared range and
//! stores `floor(value * 2^n)`. Arithmetic between two fixed point
//! values widens the result format so the mathematically exact result
//! remains representable where possible; arithmetic against plain
//! scalars keeps the left operand's format. Conversions between formats
//! go through [`FixedPoint::to`] under an explicit [`Policy`].
//!
//! Enable the `serde` feature flag to have serialization and
//! deserialization capabilities for the types in this crate.

// The format descriptor and its parser.
mod format;

// Serialization and deserialization implementations.
#[cfg(feature = "serde")]
mod serde;

pub use crate::format::{Format, MAX_TOTAL_BITS};

use core::cmp::Ordering;
use core::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, Shl, Shr, Sub, SubAssign,
};
use core::str::FromStr;

/// An error type covering malformed or oversized format descriptors,
/// values that do not fit their target format, unknown conversion
/// policies, and conversions that would silently discard information.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The format descriptor does not match `Q<int_bits><sep><frac_bits>`.
    #[error("invalid format specification {0:?}")]
    InvalidFormat(String),
    /// The format requests more bits than the backing store allows.
    #[error(
        "the implementation only allows {} bits for now, {} were requested",
        MAX_TOTAL_BITS,
        .format.total_bits()
    )]
    WidthExceeded {
        /// The offending format.
        format: Format,
    },
    /// The value lies outside the representable range of the format.
    #[error("a value of {value} does not fit in the given format {format}")]
    OutOfRange {
        /// The rejected value.
        value: f64,
        /// The format it was checked against.
        format: Format,
    },
    /// The conversion policy name is not one of `exact`, `round`, `fit`.
    #[error("invalid policy {0:?} given")]
    InvalidPolicy(String),
    /// An `exact` conversion would not reproduce the value bit for bit.
    #[error("rounding {value} to format {format} is not allowed with the exact policy")]
    PrecisionLoss {
        /// The value that cannot be represented exactly.
        value: f64,
        /// The conversion target format.
        format: Format,
    },
}

/// Conversion policy applied by [`FixedPoint::to`].
///
/// Policies are commonly selected by name:
///
/// ```
/// # fn main() -> Result<(), qfixed::Error> {
/// # use qfixed::Policy;
/// assert_eq!("fit".parse::<Policy>()?, Policy::Fit);
/// assert!("truncate".parse::<Policy>().is_err());
/// # Ok(()) }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Policy {
    /// The converted value must reproduce the source value bit for bit.
    #[default]
    Exact,
    /// Fractional precision may be discarded; out of range values still
    /// fail.
    Round,
    /// Out of range values saturate at the nearest representable bound
    /// instead of failing.
    Fit,
}

impl FromStr for Policy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Policy::Exact),
            "round" => Ok(Policy::Round),
            "fit" => Ok(Policy::Fit),
            _ => Err(Error::InvalidPolicy(s.to_owned())),
        }
    }
}

/// Right hand side of a binary fixed point operation.
///
/// Fixed point operands take part in format widening; scalar operands
/// leave the left hand side's format untouched. The two arms keep the
/// two arithmetic code paths explicit instead of dispatching on runtime
/// type checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    /// Another fixed point value, with its own format.
    Fixed(FixedPoint),
    /// A plain real number without a format.
    Scalar(f64),
}

impl From<FixedPoint> for Operand {
    fn from(value: FixedPoint) -> Self {
        Operand::Fixed(value)
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Scalar(value)
    }
}

macro_rules! impl_scalar_operand {
    ( $($num:ty),+ ) => {
        $(
            impl From<$num> for Operand {
                fn from(value: $num) -> Self {
                    Operand::Scalar(value as f64)
                }
            }
        )+
    };
}

impl_scalar_operand!(f32, u8, u16, u32, u64, i8, i16, i32, i64);

/// A signed fixed point value in Q(m.n) format.
///
/// The value is stored as an integer scaled by the fractional bit count
/// of its [`Format`], inside a 64 bit signed store wide enough for any
/// format within [`MAX_TOTAL_BITS`]. Values are immutable: every
/// operation returns a new value and never touches its inputs.
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), qfixed::Error> {
/// # use qfixed::FixedPoint;
/// let a = FixedPoint::new(1.5, "Q4.2")?;
/// let b = FixedPoint::new(0.25, "Q4.2")?;
///
/// // Fixed point operands widen the result format: Q4.2 + Q4.2 -> Q5.2.
/// let sum = a.try_add(b)?;
/// assert_eq!(sum.to_float(), 1.75);
/// assert_eq!(sum.format().to_string(), "Q5.2");
///
/// // Scalar operands keep the left operand's format.
/// let shifted = a.try_add(0.25)?;
/// assert_eq!(shifted.format().to_string(), "Q4.2");
/// # Ok(()) }
/// ```
///
/// The example below fails because the value exceeds the range the
/// format can represent:
///
/// ```
/// # use qfixed::FixedPoint;
/// // Q2.0 covers [-2, 1]: two integer bits, one of them the sign.
/// assert!(FixedPoint::new(1.5, "Q2.0").is_err());
/// ```
#[derive(Copy, Clone)]
pub struct FixedPoint {
    scaled: i64,
    format: Format,
}

impl FixedPoint {
    /// Constructs a fixed point value from a real number and a format
    /// descriptor.
    ///
    /// The value must lie within the closed range of the format and the
    /// format must fit [`MAX_TOTAL_BITS`]. The store keeps
    /// `floor(value * 2^n)`, truncating toward negative infinity:
    ///
    /// ```
    /// # fn main() -> Result<(), qfixed::Error> {
    /// # use qfixed::FixedPoint;
    /// let a = FixedPoint::new(0.1, "Q0.4")?;
    /// assert_eq!(a.scaled(), 1); // floor(1.6)
    ///
    /// let b = FixedPoint::new(-0.1, "Q0.4")?;
    /// assert_eq!(b.scaled(), -2); // floor(-1.6), not -1
    /// # Ok(()) }
    /// ```
    pub fn new(value: f64, fmt: &str) -> Result<Self, Error> {
        Self::from_parts(value, fmt.parse()?)
    }

    /// Constructs a fixed point value from a real number and an already
    /// parsed format.
    ///
    /// The range check runs against the declared format before the bit
    /// width ceiling is enforced, so an out of range value in an
    /// oversized format reports [`Error::OutOfRange`].
    pub fn from_parts(value: f64, format: Format) -> Result<Self, Error> {
        // NaN fails the containment check and is rejected as well.
        if !(format.min_value()..=format.max_value()).contains(&value) {
            return Err(Error::OutOfRange { value, format });
        }
        format.check_width()?;

        Ok(Self {
            scaled: (value / format.resolution()).floor() as i64,
            format,
        })
    }

    /// Returns the smallest representable value of `format`.
    pub fn min_of(format: Format) -> Result<Self, Error> {
        Self::from_parts(format.min_value(), format)
    }

    /// Returns the largest representable value of `format`.
    pub fn max_of(format: Format) -> Result<Self, Error> {
        Self::from_parts(format.max_value(), format)
    }

    /// Returns the backing scaled integer, `floor(value * 2^n)`.
    pub const fn scaled(&self) -> i64 {
        self.scaled
    }

    /// Returns the format the value is stored in.
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Smallest value representable in this value's format.
    pub fn min_value(&self) -> f64 {
        self.format.min_value()
    }

    /// Largest value representable in this value's format.
    pub fn max_value(&self) -> f64 {
        self.format.max_value()
    }

    /// Smallest representable increment in this value's format.
    pub fn resolution(&self) -> f64 {
        self.format.resolution()
    }

    /// Real number projection of the value, `scaled * 2^(-n)`.
    pub fn to_float(self) -> f64 {
        self.scaled as f64 * self.format.resolution()
    }

    /// Integer part, an arithmetic shift of the scaled store truncating
    /// toward negative infinity: `-1.75` reports `-2`.
    pub const fn integer_part(&self) -> i64 {
        self.scaled >> self.format.frac_bits()
    }

    /// Non-negative fractional magnitude, extracted by masking the low
    /// `n` bits of the scaled store: `-1.75` reports `0.25`.
    pub fn fractional_part(&self) -> f64 {
        let mask = (1i64 << self.format.frac_bits()) - 1;
        (self.scaled & mask) as f64 * self.format.resolution()
    }

    /// Rounds the real projection to `ndigits` decimal digits, ties to
    /// even, and reconstructs the result in the same format.
    pub fn round_to(self, ndigits: i32) -> Result<Self, Error> {
        let factor = 10f64.powi(ndigits);
        let rounded = round_half_even(self.to_float() * factor) / factor;
        Self::from_parts(rounded, self.format)
    }

    /// Converts the value to a new format according to `policy`.
    ///
    /// The target format's bit width ceiling is checked up front; the
    /// policy then decides how range and precision mismatches are
    /// handled. [`Policy::Fit`] saturates asymmetrically: strictly
    /// positive values clamp to the new maximum, zero and negative
    /// values clamp to the new minimum.
    ///
    /// ```
    /// # fn main() -> Result<(), qfixed::Error> {
    /// # use qfixed::{FixedPoint, Policy};
    /// let wide = FixedPoint::new(1.5, "Q8.8")?;
    ///
    /// assert_eq!(wide.to("Q2.1", Policy::Exact)?.to_float(), 1.5);
    /// assert!(wide.to("Q1.1", Policy::Exact).is_err());
    /// assert_eq!(wide.to("Q1.1", Policy::Fit)?.to_float(), 0.5);
    /// # Ok(()) }
    /// ```
    pub fn to(self, fmt: &str, policy: Policy) -> Result<Self, Error> {
        let format: Format = fmt.parse()?;
        format.check_width()?;
        let value = self.to_float();

        match policy {
            Policy::Exact => {
                let converted = Self::from_parts(value, format)?;
                if converted.to_float() != value {
                    return Err(Error::PrecisionLoss { value, format });
                }
                Ok(converted)
            }
            Policy::Round => Self::from_parts(value, format),
            Policy::Fit => {
                let clamped = if value > 0.0 {
                    value.min(format.max_value())
                } else {
                    value.max(format.min_value())
                };
                Self::from_parts(clamped, format)
            }
        }
    }

    /// Adds another fixed point value or a scalar.
    ///
    /// Fixed point operands widen the result format to
    /// `Q(max(m1,m2)+1).(max(n1,n2))`, reserving a carry bit; scalar
    /// operands keep `self`'s format. The result is validated against
    /// the derived format.
    pub fn try_add(self, rhs: impl Into<Operand>) -> Result<Self, Error> {
        match rhs.into() {
            Operand::Fixed(other) => {
                let format = Format::new(
                    self.format.int_bits().max(other.format.int_bits()) + 1,
                    self.format.frac_bits().max(other.format.frac_bits()),
                );
                Self::from_parts(self.to_float() + other.to_float(), format)
            }
            Operand::Scalar(scalar) => Self::from_parts(self.to_float() + scalar, self.format),
        }
    }

    /// Subtracts another fixed point value or a scalar.
    ///
    /// Widening matches [`FixedPoint::try_add`]; there is no
    /// sign-specific rule.
    pub fn try_sub(self, rhs: impl Into<Operand>) -> Result<Self, Error> {
        match rhs.into() {
            Operand::Fixed(other) => {
                let format = Format::new(
                    self.format.int_bits().max(other.format.int_bits()) + 1,
                    self.format.frac_bits().max(other.format.frac_bits()),
                );
                Self::from_parts(self.to_float() - other.to_float(), format)
            }
            Operand::Scalar(scalar) => Self::from_parts(self.to_float() - scalar, self.format),
        }
    }

    /// Multiplies by another fixed point value or a scalar.
    ///
    /// Fixed point operands widen the result format to
    /// `Q(m1+m2).(max(n1,n2))`. Note that the fraction width follows the
    /// wider operand rather than the sum of both widths, which differs
    /// from conventional Q format multiplication; the rule is kept
    /// deliberately (see DESIGN.md). Scalar operands keep `self`'s
    /// format.
    pub fn try_mul(self, rhs: impl Into<Operand>) -> Result<Self, Error> {
        match rhs.into() {
            Operand::Fixed(other) => {
                let format = Format::new(
                    self.format.int_bits() + other.format.int_bits(),
                    self.format.frac_bits().max(other.format.frac_bits()),
                );
                Self::from_parts(self.to_float() * other.to_float(), format)
            }
            Operand::Scalar(scalar) => Self::from_parts(self.to_float() * scalar, self.format),
        }
    }

    /// Divides by another fixed point value or a scalar.
    ///
    /// Fixed point operands widen the result format to
    /// `Q(m1+n2).(max(n1,m1))`, a non-standard rule kept deliberately
    /// (see DESIGN.md). Scalar operands keep `self`'s format. Division
    /// by zero produces an unrepresentable projection and fails the
    /// range check of the derived format.
    pub fn try_div(self, rhs: impl Into<Operand>) -> Result<Self, Error> {
        match rhs.into() {
            Operand::Fixed(other) => {
                let format = Format::new(
                    self.format.int_bits() + other.format.frac_bits(),
                    self.format.frac_bits().max(self.format.int_bits()),
                );
                Self::from_parts(self.to_float() / other.to_float(), format)
            }
            Operand::Scalar(scalar) => Self::from_parts(self.to_float() / scalar, self.format),
        }
    }

    /// Raises the value to an integer power.
    ///
    /// The result format multiplies the integer width by the exponent
    /// and keeps the fraction width: squaring a Q4.8 value yields Q8.8.
    ///
    /// ```
    /// # fn main() -> Result<(), qfixed::Error> {
    /// # use qfixed::FixedPoint;
    /// let a = FixedPoint::new(2.0, "Q4.8")?;
    /// let b = a.try_pow(2)?;
    ///
    /// assert_eq!(b.to_float(), 4.0);
    /// assert_eq!(b.format().to_string(), "Q8.8");
    /// # Ok(()) }
    /// ```
    pub fn try_pow(self, exp: u32) -> Result<Self, Error> {
        let format = Format::new(
            self.format.int_bits().saturating_mul(exp),
            self.format.frac_bits(),
        );
        Self::from_parts(self.to_float().powi(exp as i32), format)
    }

    /// Negates the value, keeping the format.
    ///
    /// The result is re-validated: negating the minimum representable
    /// value overflows the asymmetric range and fails with
    /// [`Error::OutOfRange`].
    pub fn try_neg(self) -> Result<Self, Error> {
        Self::from_parts(-self.to_float(), self.format)
    }

    /// Absolute value, keeping the format.
    ///
    /// Re-validated like [`FixedPoint::try_neg`]; the absolute value of
    /// the minimum representable value does not fit.
    pub fn try_abs(self) -> Result<Self, Error> {
        Self::from_parts(self.to_float().abs(), self.format)
    }

    /// Quotient/remainder pair, collapsed to zero.
    ///
    /// Deliberate stub: the remainder family is not implemented and
    /// always returns zero in `self`'s format. Callers needing real
    /// fixed point division with remainder must not rely on it.
    pub fn divmod(self, _rhs: impl Into<Operand>) -> Self {
        self.zero_like()
    }

    /// Flooring division, collapsed to zero. Deliberate stub, see
    /// [`FixedPoint::divmod`].
    pub fn floor_div(self, _rhs: impl Into<Operand>) -> Self {
        self.zero_like()
    }

    /// Remainder, collapsed to zero. Deliberate stub, see
    /// [`FixedPoint::divmod`].
    pub fn modulo(self, _rhs: impl Into<Operand>) -> Self {
        self.zero_like()
    }

    /// Remainder with the operands swapped, collapsed to zero.
    /// Deliberate stub, see [`FixedPoint::divmod`].
    pub fn reverse_modulo(self, _lhs: impl Into<Operand>) -> Self {
        self.zero_like()
    }

    const fn zero_like(self) -> Self {
        Self {
            scaled: 0,
            format: self.format,
        }
    }
}

/// Decimal rounding helper with ties going to the even neighbor.
fn round_half_even(x: f64) -> f64 {
    let nearest = x.round();
    if (x - x.trunc()).abs() == 0.5 && nearest % 2.0 != 0.0 {
        nearest - x.signum()
    } else {
        nearest
    }
}

impl core::fmt::Display for FixedPoint {
    /// The [`Display`][core::fmt::Display] implementation renders the
    /// canonical textual form `FixedPoint(<value>, '<format>')`, with
    /// the real projection in its shortest round-trip float notation.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "FixedPoint({:?}, '{}')", self.to_float(), self.format)
    }
}

impl core::fmt::Debug for FixedPoint {
    /// The [`Debug`][core::fmt::Debug] implementation shows the real
    /// projection and the scaled store alongside the format and its
    /// derived bounds.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FixedPoint")
            .field("value", &self.to_float())
            .field("scaled", &self.scaled)
            .field("format", &self.format)
            .field("min_value", &self.min_value())
            .field("max_value", &self.max_value())
            .field("resolution", &self.resolution())
            .finish()
    }
}

impl PartialEq for FixedPoint {
    /// Values in identical formats compare by their raw scaled
    /// integers, exactly and without precision loss; values in
    /// different formats compare by their real projections.
    fn eq(&self, other: &Self) -> bool {
        if self.format == other.format {
            self.scaled == other.scaled
        } else {
            self.to_float() == other.to_float()
        }
    }
}

impl PartialOrd for FixedPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.format == other.format {
            self.scaled.partial_cmp(&other.scaled)
        } else {
            self.to_float().partial_cmp(&other.to_float())
        }
    }
}

impl PartialEq<f64> for FixedPoint {
    fn eq(&self, other: &f64) -> bool {
        self.to_float() == *other
    }
}

impl PartialEq<FixedPoint> for f64 {
    fn eq(&self, other: &FixedPoint) -> bool {
        *self == other.to_float()
    }
}

impl PartialOrd<f64> for FixedPoint {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.to_float().partial_cmp(other)
    }
}

impl PartialOrd<FixedPoint> for f64 {
    fn partial_cmp(&self, other: &FixedPoint) -> Option<Ordering> {
        self.partial_cmp(&other.to_float())
    }
}

impl From<FixedPoint> for f64 {
    fn from(value: FixedPoint) -> Self {
        value.to_float()
    }
}

impl From<FixedPoint> for i64 {
    fn from(value: FixedPoint) -> Self {
        value.integer_part()
    }
}

impl<T: Into<Operand>> Add<T> for FixedPoint {
    type Output = FixedPoint;

    /// Add a fixed point value or a scalar.
    ///
    /// # Panics
    ///
    /// This function panics if the result does not fit the derived
    /// format.
    fn add(self, rhs: T) -> Self::Output {
        self.try_add(rhs).expect("addition out of range")
    }
}

impl<T: Into<Operand>> Sub<T> for FixedPoint {
    type Output = FixedPoint;

    /// Subtract a fixed point value or a scalar.
    ///
    /// # Panics
    ///
    /// This function panics if the result does not fit the derived
    /// format.
    fn sub(self, rhs: T) -> Self::Output {
        self.try_sub(rhs).expect("subtraction out of range")
    }
}

impl<T: Into<Operand>> Mul<T> for FixedPoint {
    type Output = FixedPoint;

    /// Multiply by a fixed point value or a scalar.
    ///
    /// # Panics
    ///
    /// This function panics if the result does not fit the derived
    /// format.
    fn mul(self, rhs: T) -> Self::Output {
        self.try_mul(rhs).expect("multiplication out of range")
    }
}

impl<T: Into<Operand>> Div<T> for FixedPoint {
    type Output = FixedPoint;

    /// Divide by a fixed point value or a scalar.
    ///
    /// # Panics
    ///
    /// This function panics if the result does not fit the derived
    /// format.
    fn div(self, rhs: T) -> Self::Output {
        self.try_div(rhs).expect("division out of range")
    }
}

impl Add<FixedPoint> for f64 {
    type Output = FixedPoint;

    fn add(self, rhs: FixedPoint) -> Self::Output {
        rhs + self
    }
}

impl Mul<FixedPoint> for f64 {
    type Output = FixedPoint;

    fn mul(self, rhs: FixedPoint) -> Self::Output {
        rhs * self
    }
}

impl Neg for FixedPoint {
    type Output = FixedPoint;

    /// # Panics
    ///
    /// This function panics when negating the minimum representable
    /// value of the format.
    fn neg(self) -> Self::Output {
        self.try_neg().expect("negation out of range")
    }
}

impl<T: Into<Operand>> Rem<T> for FixedPoint {
    type Output = FixedPoint;

    /// Routed to the stubbed [`FixedPoint::modulo`]; always zero.
    fn rem(self, rhs: T) -> Self::Output {
        self.modulo(rhs)
    }
}

impl Shl<u32> for FixedPoint {
    type Output = FixedPoint;

    /// Shifts the scaled store left, keeping the format. No range check
    /// is performed; the caller is responsible for the result.
    fn shl(self, rhs: u32) -> Self::Output {
        FixedPoint {
            scaled: self.scaled << rhs,
            format: self.format,
        }
    }
}

impl Shr<u32> for FixedPoint {
    type Output = FixedPoint;

    /// Shifts the scaled store right (arithmetic shift), keeping the
    /// format. No range check is performed.
    fn shr(self, rhs: u32) -> Self::Output {
        FixedPoint {
            scaled: self.scaled >> rhs,
            format: self.format,
        }
    }
}

impl<T: Into<Operand>> AddAssign<T> for FixedPoint {
    fn add_assign(&mut self, rhs: T) {
        *self = *self + rhs;
    }
}

impl<T: Into<Operand>> SubAssign<T> for FixedPoint {
    fn sub_assign(&mut self, rhs: T) {
        *self = *self - rhs;
    }
}

impl<T: Into<Operand>> MulAssign<T> for FixedPoint {
    fn mul_assign(&mut self, rhs: T) {
        *self = *self * rhs;
    }
}

impl<T: Into<Operand>> DivAssign<T> for FixedPoint {
    fn div_assign(&mut self, rhs: T) {
        *self = *self / rhs;
    }
}
