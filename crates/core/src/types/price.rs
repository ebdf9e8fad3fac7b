//! Type-safe price representation using decimal arithmetic.
//!
//! All catalog prices and order totals are amounts in Kenyan Shillings.
//! Amounts are whole-unit currency, so display formatting uses grouped
//! digits with zero fractional digits (e.g. `Ksh 2,200`).

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A monetary amount in Kenyan Shillings.
///
/// Arithmetic is exact decimal arithmetic; nothing is truncated. Rounding
/// happens only at display time, in [`Price::format_ksh`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero shillings.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole-shilling amount.
    #[must_use]
    pub fn from_whole(shillings: i64) -> Self {
        Self(Decimal::from(shillings))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// A line total: unit price times a quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Format as `Ksh 1,234` - grouped digits, zero fractional digits.
    ///
    /// Matches the shop's customer-facing currency format on invoices and
    /// in order emails.
    #[must_use]
    pub fn format_ksh(&self) -> String {
        // Catalog prices are whole shillings well inside i64 range.
        let whole = self.0.round_dp(0).to_i64().unwrap_or_default();
        let negative = whole < 0;
        let grouped = group_thousands(whole.unsigned_abs());
        if negative {
            format!("Ksh -{grouped}")
        } else {
            format!("Ksh {grouped}")
        }
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_ksh())
    }
}

/// Insert a comma between every group of three digits.
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
