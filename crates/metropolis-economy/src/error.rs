//! Error types for the metropolis-economy crate.

use metropolis_db::StoreError;
use metropolis_types::{CityId, CreditRating};
use rust_decimal::Decimal;

/// Errors from the economy simulators and city finance operations.
#[derive(Debug, thiserror::Error)]
pub enum EconomyError {
    /// The storage layer failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// The city does not exist.
    #[error("city not found: {0}")]
    CityNotFound(CityId),

    /// A tax rate outside the permitted band.
    #[error("tax rate {rate} outside [{min}, {max}]")]
    TaxRateOutOfRange {
        /// The requested rate.
        rate: Decimal,
        /// Lowest permitted rate.
        min: Decimal,
        /// Highest permitted rate.
        max: Decimal,
    },

    /// Bond issuance refused because the rating is too low.
    #[error("credit rating {0:?} too low to issue bonds")]
    RatingTooLow(CreditRating),

    /// Bond issuance would push outstanding debt over the cap.
    #[error("debt {debt} would exceed cap {cap}")]
    DebtCapExceeded {
        /// Outstanding debt after issuance.
        debt: Decimal,
        /// Configured cap.
        cap: Decimal,
    },

    /// A non-positive principal or zero term.
    #[error("invalid bond terms: {0}")]
    InvalidBond(&'static str),

    /// Overflow in a money computation.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: &'static str,
    },
}
