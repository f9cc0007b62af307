//! Economy tuning knobs.
//!
//! Rates and thresholds are percentages held as [`Decimal`], the same unit
//! as the city's tax rates. Demand weights are plain `f64` since demand is a
//! dimensionless signal in [-1, 1].

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Tax bounds and the thresholds of the daily penalty run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaxPolicy {
    /// Lowest rate a city may set (default: 0).
    pub min_rate: Decimal,
    /// Highest rate a city may set (default: 20).
    pub max_rate: Decimal,
    /// Rate at which taxes neither attract nor repel (default: 9).
    pub neutral_rate: Decimal,
    /// Residential rate above which residents leave (default: 12).
    pub exodus_threshold: Decimal,
    /// Residents leaving per point of excess (default: 1).
    pub exodus_rate: Decimal,
    /// Commercial rate above which office salaries are cut (default: 12).
    pub salary_cut_threshold: Decimal,
    /// Fraction of salary cut per point of excess (default: 0.02).
    pub cut_per_percent: Decimal,
    /// Salaries are never cut below this (default: 1200).
    pub minimum_wage: Decimal,
    /// Industrial rate above which factories may be demolished (default: 15).
    pub destruction_threshold: Decimal,
    /// Demolition probability per point of excess (default: 0.05).
    pub destroy_chance_per_percent: Decimal,
    /// Hour of day the penalty run fires (default: 3).
    pub penalty_hour: u32,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self {
            min_rate: Decimal::ZERO,
            max_rate: Decimal::from(20),
            neutral_rate: Decimal::from(9),
            exodus_threshold: Decimal::from(12),
            exodus_rate: Decimal::ONE,
            salary_cut_threshold: Decimal::from(12),
            cut_per_percent: Decimal::new(2, 2),
            minimum_wage: Decimal::from(1200),
            destruction_threshold: Decimal::from(15),
            destroy_chance_per_percent: Decimal::new(5, 2),
            penalty_hour: 3,
        }
    }
}

/// Demand shift an enacted ordinance applies to each sector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SectorEffect {
    /// Shift to residential demand.
    pub residential: f64,
    /// Shift to office demand.
    pub office: f64,
    /// Shift to industrial demand.
    pub industrial: f64,
}

/// Weights of the R/O/I demand model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DemandConfig {
    /// Target share of residential buildings (default: 0.5).
    pub ideal_residential: f64,
    /// Target share of office buildings (default: 0.3).
    pub ideal_office: f64,
    /// Target share of industrial buildings (default: 0.2).
    pub ideal_industrial: f64,
    /// Demand shift per point below the neutral rate (default: 0.05).
    pub sensitivity: f64,
    /// Demand lost per underfunded department (default: 0.2).
    pub department_penalty: f64,
    /// Known ordinances and their effects. Enacted names missing here
    /// have no effect.
    pub ordinances: BTreeMap<String, SectorEffect>,
}

impl Default for DemandConfig {
    fn default() -> Self {
        let ordinances = [
            (
                "rent_control",
                SectorEffect {
                    residential: 0.1,
                    office: 0.0,
                    industrial: 0.0,
                },
            ),
            (
                "tourism_campaign",
                SectorEffect {
                    residential: 0.0,
                    office: 0.1,
                    industrial: 0.0,
                },
            ),
            (
                "pollution_controls",
                SectorEffect {
                    residential: 0.1,
                    office: 0.0,
                    industrial: -0.15,
                },
            ),
        ]
        .into_iter()
        .map(|(name, effect)| (name.to_owned(), effect))
        .collect();
        Self {
            ideal_residential: 0.5,
            ideal_office: 0.3,
            ideal_industrial: 0.2,
            sensitivity: 0.05,
            department_penalty: 0.2,
            ordinances,
        }
    }
}

/// Bond and credit settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FinanceConfig {
    /// Outstanding principal may not exceed this (default: 500000).
    pub debt_cap: Decimal,
    /// Hour of day the finance run fires (default: 0).
    pub finance_hour: u32,
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            debt_cap: Decimal::from(500_000),
            finance_hour: 0,
        }
    }
}

/// The `economy:` section of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Tax bounds and penalties.
    pub tax: TaxPolicy,
    /// Demand model weights.
    pub demand: DemandConfig,
    /// Bonds and credit.
    pub finance: FinanceConfig,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn defaults_are_consistent() {
        let tax = TaxPolicy::default();
        assert!(tax.min_rate <= tax.neutral_rate && tax.neutral_rate <= tax.max_rate);
        assert!(tax.destruction_threshold > tax.exodus_threshold);
        assert_eq!(tax.cut_per_percent, dec!(0.02));
        assert!(DemandConfig::default().ordinances.contains_key("rent_control"));
    }
}
