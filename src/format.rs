//! The Q(m.n) format descriptor and its derived range properties.
//!
//! A [`Format`] is parsed once from a textual descriptor such as `Q4.8`
//! and is immutable afterwards. The value type in the crate root carries
//! a `Format` with every number and derives all range information from
//! it, so this module owns no state beyond the two bit widths.

use core::str::FromStr;

use crate::Error;

/// Widest allowed format, integer and fractional bits combined.
///
/// Formats requesting more bits than this are rejected when a value is
/// constructed in them. The backing store is an `i64`, so the ceiling can
/// be raised without touching the representation as long as it stays
/// below 64 bits.
pub const MAX_TOTAL_BITS: u32 = 32;

/// Bit-width pair describing a Q(m.n) fixed point format.
///
/// `int_bits` (m) counts the integer bits including the sign, `frac_bits`
/// (n) counts the fractional bits. The numeric range and resolution of
/// any value in this format follow from the pair:
///
/// ```
/// # fn main() -> Result<(), qfixed::Error> {
/// # use qfixed::Format;
/// let format: Format = "Q2.1".parse()?;
/// assert_eq!(format.min_value(), -2.0);
/// assert_eq!(format.max_value(), 1.5);
/// assert_eq!(format.resolution(), 0.5);
/// # Ok(()) }
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Format {
    int_bits: u32,
    frac_bits: u32,
}

impl Format {
    /// Builds a format from raw bit widths, without any ceiling check.
    ///
    /// The ceiling is enforced when a value is constructed in the format,
    /// mirroring the parser which also accepts arbitrary widths.
    pub const fn new(int_bits: u32, frac_bits: u32) -> Self {
        Self {
            int_bits,
            frac_bits,
        }
    }

    /// Returns the number of integer bits (m), sign included.
    pub const fn int_bits(&self) -> u32 {
        self.int_bits
    }

    /// Returns the number of fractional bits (n).
    pub const fn frac_bits(&self) -> u32 {
        self.frac_bits
    }

    /// Returns the combined bit width of both parts.
    pub const fn total_bits(&self) -> u64 {
        self.int_bits as u64 + self.frac_bits as u64
    }

    /// Smallest value representable in this format, `-2^(m-1)`.
    pub fn min_value(&self) -> f64 {
        -pow2(self.int_bits as i64 - 1)
    }

    /// Largest value representable in this format, `2^(m-1) - 2^(-n)`.
    pub fn max_value(&self) -> f64 {
        pow2(self.int_bits as i64 - 1) - self.resolution()
    }

    /// Smallest representable increment, `2^(-n)`.
    pub fn resolution(&self) -> f64 {
        pow2(-(self.frac_bits as i64))
    }

    /// Fails with [`Error::WidthExceeded`] when the format requests more
    /// than [`MAX_TOTAL_BITS`] bits.
    pub fn check_width(&self) -> Result<(), Error> {
        if self.total_bits() > MAX_TOTAL_BITS as u64 {
            return Err(Error::WidthExceeded { format: *self });
        }
        Ok(())
    }
}

impl core::fmt::Display for Format {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Q{}.{}", self.int_bits, self.frac_bits)
    }
}

impl FromStr for Format {
    type Err = Error;

    /// Parses a `Q<int_bits><separator><frac_bits>` descriptor.
    ///
    /// The separator is exactly one character and may be anything that is
    /// not a digit, so `Q4.8` and `Q4,8` describe the same format. The
    /// match is a prefix match: content after the fractional digit group
    /// is ignored, so `Q4.8xyz` parses as `Q4.8`.
    ///
    /// Fails when the leading `Q` is missing, either digit group is empty
    /// or not a valid non-negative integer, or the separator is missing
    /// because the string ends after the first group.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidFormat(s.to_owned());

        let rest = s.strip_prefix('Q').ok_or_else(invalid)?;
        let int_digits = digits_prefix(rest);
        if int_digits.is_empty() {
            return Err(invalid());
        }

        // The digit scan above stopped at the first non-digit, which
        // doubles as the separator. A missing one means the descriptor
        // ended right after the integer group.
        let mut after_sep = rest[int_digits.len()..].chars();
        if after_sep.next().is_none() {
            return Err(invalid());
        }

        let frac_digits = digits_prefix(after_sep.as_str());
        if frac_digits.is_empty() {
            return Err(invalid());
        }

        let int_bits = int_digits.parse().map_err(|_| invalid())?;
        let frac_bits = frac_digits.parse().map_err(|_| invalid())?;

        Ok(Self::new(int_bits, frac_bits))
    }
}

/// Power of two as an `f64`, with the exponent clamped so absurdly wide
/// formats saturate to `inf`/`0.0` instead of wrapping the exponent.
fn pow2(exp: i64) -> f64 {
    2f64.powi(exp.clamp(-1100, 1100) as i32)
}

/// Leading run of ASCII digits of `s`, possibly empty.
fn digits_prefix(s: &str) -> &str {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    &s[..end]
}
