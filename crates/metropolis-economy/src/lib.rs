//! City economy for the Metropolis simulation.
//!
//! - [`demand`]: the pure R/O/I demand model
//! - [`tax_penalty`]: daily effects of punitive tax rates
//! - [`finance`]: bonds, debt service and the credit rating
//!
//! Money is [`rust_decimal::Decimal`] throughout and every money operation
//! is checked. Probabilistic effects draw from a caller-supplied RNG.

pub mod config;
pub mod demand;
pub mod error;
pub mod finance;
pub mod tax_penalty;

pub use config::{DemandConfig, EconomyConfig, FinanceConfig, SectorEffect, TaxPolicy};
pub use demand::{Demand, DemandCalculator};
pub use error::EconomyError;
pub use finance::{FinanceSimulator, issue_bond, rate_credit};
pub use tax_penalty::{TaxPenaltySimulator, TaxPenaltyStore, set_tax_rate};
