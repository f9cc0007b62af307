//! Municipal bonds and the city credit rating.
//!
//! The daily run accrues one day of interest on every outstanding bond
//! (`principal * rate / 100 / 365`, rounded to cents), repays bonds that
//! reached maturity, and rerates the city from its cash-to-debt ratio.
//! New debt goes through [`issue_bond`], which prices it off the current
//! rating. A day already recorded on the finance watermark is never
//! serviced twice.

use metropolis_db::{ActivityLogger, CityRepository};
use metropolis_types::{
    ActivityKind, Bond, BondId, CityId, CreditRating, DailyPipeline, SimEvent,
};
use rust_decimal::Decimal;

use crate::config::FinanceConfig;
use crate::error::EconomyError;

const DAYS_PER_YEAR: u32 = 365;

/// Worst rating at which a city may still borrow.
pub const MIN_ISSUING_RATING: CreditRating = CreditRating::Bb;

fn overflow(context: &'static str) -> EconomyError {
    EconomyError::ArithmeticOverflow { context }
}

/// Total outstanding principal.
pub fn outstanding_debt(bonds: &[Bond]) -> Result<Decimal, EconomyError> {
    bonds.iter().try_fold(Decimal::ZERO, |acc, b| {
        acc.checked_add(b.principal).ok_or_else(|| overflow("debt"))
    })
}

/// Rating implied by cash on hand against outstanding debt.
///
/// A debt-free city rates AAA unless it is overdrawn, which rates C.
pub fn rate_credit(treasury: Decimal, debt: Decimal) -> CreditRating {
    if debt <= Decimal::ZERO {
        return if treasury.is_sign_negative() {
            CreditRating::C
        } else {
            CreditRating::Aaa
        };
    }
    let Some(ratio) = treasury.checked_div(debt) else {
        return CreditRating::C;
    };
    let bands = [
        (Decimal::TWO, CreditRating::Aaa),
        (Decimal::ONE, CreditRating::Aa),
        (Decimal::new(5, 1), CreditRating::A),
        (Decimal::new(25, 2), CreditRating::Bbb),
        (Decimal::new(1, 1), CreditRating::Bb),
        (Decimal::ZERO, CreditRating::B),
    ];
    bands
        .into_iter()
        .find(|(floor, _)| ratio >= *floor)
        .map_or(CreditRating::C, |(_, rating)| rating)
}

/// Annual interest rate, in percent, a new bond pays at a rating.
pub fn interest_rate_for(rating: CreditRating) -> Decimal {
    match rating {
        CreditRating::Aaa => Decimal::TWO,
        CreditRating::Aa => Decimal::new(25, 1),
        CreditRating::A => Decimal::from(3),
        CreditRating::Bbb => Decimal::from(4),
        CreditRating::Bb => Decimal::from(6),
        CreditRating::B => Decimal::from(9),
        CreditRating::C => Decimal::from(12),
    }
}

/// One day of interest on a bond.
pub fn daily_interest(bond: &Bond) -> Result<Decimal, EconomyError> {
    bond.principal
        .checked_mul(bond.interest_rate)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .and_then(|v| v.checked_div(Decimal::from(DAYS_PER_YEAR)))
        .map(|v| v.round_dp(2))
        .ok_or_else(|| overflow("bond interest"))
}

/// Daily bond servicing and credit rerating.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinanceSimulator;

impl FinanceSimulator {
    /// Create the simulator.
    pub const fn new() -> Self {
        Self
    }

    /// Service `city`'s bonds for absolute day `day`, once.
    pub fn run<S>(
        &self,
        store: &mut S,
        city: CityId,
        day: u64,
        activity: &mut dyn ActivityLogger,
    ) -> Result<Vec<SimEvent>, EconomyError>
    where
        S: CityRepository + ?Sized,
    {
        if !store.claim_day(city, DailyPipeline::Finance, day)? {
            tracing::debug!(%city, day, "finance already closed for day");
            return Ok(Vec::new());
        }
        let Some(c) = store.get_city(city)? else {
            tracing::warn!(%city, "city vanished, finance run skipped");
            return Ok(Vec::new());
        };
        let mut economy = c.economy;

        let mut interest = Decimal::ZERO;
        for bond in &economy.bonds {
            interest = interest
                .checked_add(daily_interest(bond)?)
                .ok_or_else(|| overflow("interest total"))?;
        }
        let (matured, outstanding): (Vec<Bond>, Vec<Bond>) = economy
            .bonds
            .into_iter()
            .partition(|b| day >= b.maturity_day());
        let repaid = outstanding_debt(&matured)?;
        economy.bonds = outstanding;

        let outflow = interest
            .checked_add(repaid)
            .ok_or_else(|| overflow("debt service"))?;
        let treasury = if outflow.is_zero() {
            c.treasury
        } else {
            let delta = Decimal::ZERO
                .checked_sub(outflow)
                .ok_or_else(|| overflow("debt service"))?;
            store.adjust_treasury(city, delta)?
        };

        let previous = economy.credit_rating;
        economy.credit_rating = rate_credit(treasury, outstanding_debt(&economy.bonds)?);
        let rating = economy.credit_rating;
        store.update_economy(city, economy)?;

        for bond in &matured {
            activity.log(
                ActivityKind::Finance,
                &format!("bond repaid: {}", bond.principal),
                serde_json::json!({ "bond_id": bond.id, "day": day }),
            );
        }
        tracing::info!(%city, day, %interest, %repaid, %treasury, ?rating, "finance day closed");

        let mut events = Vec::new();
        if rating != previous {
            activity.log(
                ActivityKind::Finance,
                &format!("credit rating changed from {previous:?} to {rating:?}"),
                serde_json::json!({ "from": previous, "to": rating, "day": day }),
            );
            events.push(SimEvent::CreditRatingChanged {
                from: previous,
                to: rating,
            });
        }
        Ok(events)
    }
}

/// Borrow `principal` for `term_days`, crediting the treasury.
///
/// Refused below [`MIN_ISSUING_RATING`] or when outstanding debt would
/// exceed the configured cap. The coupon comes from [`interest_rate_for`].
pub fn issue_bond<S>(
    store: &mut S,
    city: CityId,
    principal: Decimal,
    term_days: u64,
    today: u64,
    config: &FinanceConfig,
) -> Result<Bond, EconomyError>
where
    S: CityRepository + ?Sized,
{
    if principal <= Decimal::ZERO {
        return Err(EconomyError::InvalidBond("principal must be positive"));
    }
    if term_days == 0 {
        return Err(EconomyError::InvalidBond("term must be at least one day"));
    }
    let mut economy = store
        .get_city(city)?
        .ok_or(EconomyError::CityNotFound(city))?
        .economy;
    if economy.credit_rating > MIN_ISSUING_RATING {
        return Err(EconomyError::RatingTooLow(economy.credit_rating));
    }
    let debt = outstanding_debt(&economy.bonds)?
        .checked_add(principal)
        .ok_or_else(|| overflow("debt"))?;
    if debt > config.debt_cap {
        return Err(EconomyError::DebtCapExceeded {
            debt,
            cap: config.debt_cap,
        });
    }

    let bond = Bond {
        id: BondId::new(),
        principal,
        interest_rate: interest_rate_for(economy.credit_rating),
        issued_day: today,
        term_days,
    };
    economy.bonds.push(bond.clone());
    store.update_economy(city, economy)?;
    store.adjust_treasury(city, principal)?;
    tracing::info!(%city, %principal, rate = %bond.interest_rate, term_days, "bond issued");
    Ok(bond)
}
