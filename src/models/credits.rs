//! Credits type for representing store balances and prices
//!
//! Balances are whole, non-negative credit amounts. Arithmetic is checked so
//! that a balance can never wrap below zero or overflow.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// A non-negative amount of virtual store credits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credits(u64);

impl Credits {
    /// Create a credit amount
    ///
    /// # Examples
    /// ```
    /// use credit_store::models::Credits;
    /// let price = Credits::new(500);
    /// assert_eq!(price.amount(), 500);
    /// ```
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// Create a zero amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Get the raw amount
    pub const fn amount(&self) -> u64 {
        self.0
    }

    /// Check if the amount is zero
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Subtract, returning `None` if the result would be negative
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Add, returning `None` on overflow
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Parse a credit amount from a string
    ///
    /// Accepts plain integers with optional surrounding whitespace and `_`
    /// digit separators ("1500", "1_500").
    pub fn parse(s: &str) -> Result<Self, CreditsParseError> {
        let cleaned: String = s.trim().chars().filter(|c| *c != '_').collect();
        if cleaned.is_empty() {
            return Err(CreditsParseError::InvalidFormat(s.to_string()));
        }
        cleaned
            .parse::<u64>()
            .map(Self)
            .map_err(|_| CreditsParseError::InvalidFormat(s.to_string()))
    }
}

impl Default for Credits {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Credits {
    fn from(amount: u64) -> Self {
        Self(amount)
    }
}

// Saturating: only used for reporting totals, never for balance writes.
impl Add for Credits {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl std::iter::Sum for Credits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Credits::zero(), |acc, c| acc + c)
    }
}

/// Error type for credit parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditsParseError {
    InvalidFormat(String),
}

impl fmt::Display for CreditsParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreditsParseError::InvalidFormat(s) => write!(f, "Invalid credit amount: {}", s),
        }
    }
}

impl std::error::Error for CreditsParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_sub_never_goes_negative() {
        let balance = Credits::new(499);
        assert_eq!(balance.checked_sub(Credits::new(500)), None);
        assert_eq!(
            Credits::new(500).checked_sub(Credits::new(500)),
            Some(Credits::zero())
        );
    }

    #[test]
    fn test_checked_add_overflow() {
        assert_eq!(Credits::new(u64::MAX).checked_add(Credits::new(1)), None);
        assert_eq!(
            Credits::new(1).checked_add(Credits::new(2)),
            Some(Credits::new(3))
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(Credits::parse("1500").unwrap(), Credits::new(1500));
        assert_eq!(Credits::parse(" 1_500 ").unwrap(), Credits::new(1500));
        assert!(Credits::parse("-5").is_err());
        assert!(Credits::parse("12.5").is_err());
        assert!(Credits::parse("").is_err());
    }

    #[test]
    fn test_sum() {
        let total: Credits = vec![Credits::new(100), Credits::new(200)].into_iter().sum();
        assert_eq!(total, Credits::new(300));
    }

    #[test]
    fn test_serialization() {
        let c = Credits::new(1050);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "1050");
    }
}
