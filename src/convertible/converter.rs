//! Convertible bond price to conversion-option premium.
//!
//! The bond is split into a straight-line amortized floor and the
//! conversion option:
//!
//! `option = (bond - (100 - coupon_rate * years_left)) / conversion_ratio`
//!
//! `years_left` is computed once from the terms and held for the whole run.

use super::terms::ConvertibleTerms;
use tracing::debug;

/// Turns bond prices into equivalent option premiums per share.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondToOptionConverter {
    bond_floor: f64,
    conversion_ratio: f64,
}

impl BondToOptionConverter {
    /// Fixes the bond floor and conversion ratio from the bond terms.
    #[must_use]
    pub fn new(terms: &ConvertibleTerms) -> Self {
        let years_left = terms.years_left();
        let bond_floor = 100.0 - terms.coupon_rate * years_left;
        let conversion_ratio = terms.conversion_ratio();
        debug!(
            "bond floor {:.6} (years left {:.6}), conversion ratio {:.6}",
            bond_floor, years_left, conversion_ratio
        );
        Self {
            bond_floor,
            conversion_ratio,
        }
    }

    /// Non-option part of the bond price.
    pub fn bond_floor(&self) -> f64 {
        self.bond_floor
    }

    /// Shares per 100 of face.
    pub fn conversion_ratio(&self) -> f64 {
        self.conversion_ratio
    }

    /// Option premium equivalent to `bond_price`.
    #[must_use]
    pub fn option_price(&self, bond_price: f64) -> f64 {
        (bond_price - self.bond_floor) / self.conversion_ratio
    }

    /// Bond price implied by an option premium.
    #[must_use]
    pub fn bond_price(&self, option_price: f64) -> f64 {
        self.bond_floor + self.conversion_ratio * option_price
    }
}
