use api_types::{coffee::Coffee, inventory::InventorySummary, roaster::Roaster};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{EngineError, ResultEngine, owner_totals, total_spent};

/// A bag is low on stock below this share of its initial weight.
pub const LOW_STOCK_RATIO: Decimal = Decimal::from_parts(20, 0, 0, false, 2);

/// A bag is aging once its roast is older than this many days.
pub const AGING_DAYS: i64 = 30;

const RATIO_SCALE: u32 = 4;

fn round_ratio(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATIO_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Whole days elapsed between `roast_date` and `today`.
///
/// Roast dates in the future count as 0 days.
pub fn days_since_roast(roast_date: NaiveDate, today: NaiveDate) -> i64 {
    (today - roast_date).num_days().max(0)
}

/// Share of the bag still left, as a percentage.
///
/// The ratio is rounded to 4 places before scaling, so 40g out of 250g gives
/// exactly `16`. Returns `None` when `initial` is not positive.
pub fn percentage_remaining(initial: Decimal, current: Decimal) -> Option<Decimal> {
    if initial <= Decimal::ZERO {
        return None;
    }
    let ratio = current.checked_div(initial)?;
    Some(round_ratio(ratio) * Decimal::ONE_HUNDRED)
}

/// `current / initial < 0.20`. Exactly 20% left is not low stock.
pub fn is_low_stock(coffee: &Coffee) -> bool {
    coffee.initial_weight > Decimal::ZERO
        && coffee.current_weight < coffee.initial_weight * LOW_STOCK_RATIO
}

/// More than [`AGING_DAYS`] since roast. Exactly 30 days is still fresh.
pub fn is_aging(coffee: &Coffee, today: NaiveDate) -> bool {
    days_since_roast(coffee.roast_date, today) > AGING_DAYS
}

/// Fill the derived `days_since_roast` and `percentage_remaining` fields.
pub fn enrich_coffee(coffee: &mut Coffee, today: NaiveDate) {
    coffee.days_since_roast = Some(days_since_roast(coffee.roast_date, today));
    coffee.percentage_remaining = percentage_remaining(coffee.initial_weight, coffee.current_weight);
}

/// Weight left after drinking `amount` grams from `coffee`.
pub fn consume(coffee: &Coffee, amount: Decimal) -> ResultEngine<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(EngineError::InvalidAmount(
            "consumed amount must be > 0".to_string(),
        ));
    }
    if amount > coffee.current_weight {
        return Err(EngineError::InsufficientStock {
            requested: amount,
            available: coffee.current_weight,
        });
    }
    Ok(coffee.current_weight - amount)
}

/// Ensure a bag never holds more than it started with.
pub fn validate_coffee(coffee: &Coffee) -> ResultEngine<()> {
    if coffee.current_weight > coffee.initial_weight {
        return Err(EngineError::WeightExceedsInitial {
            id: coffee.id,
            current: coffee.current_weight,
            initial: coffee.initial_weight,
        });
    }
    Ok(())
}

/// Compute the inventory summary for the coffee tracker.
///
/// `average_price_per_gram` divides the money spent by the grams left and is
/// 0 when nothing is left. The returned roasters carry refreshed spent totals
/// and bag counts.
pub fn inventory_summary(
    roasters: &[Roaster],
    coffees: &[Coffee],
    today: NaiveDate,
) -> InventorySummary {
    let total_weight: Decimal = coffees.iter().map(|coffee| coffee.current_weight).sum();
    let total_spent = total_spent(coffees);

    let average_price_per_gram = if total_weight.is_zero() {
        Decimal::ZERO
    } else {
        total_spent
            .checked_div(total_weight)
            .map(round_ratio)
            .unwrap_or_default()
    };

    let enriched = |coffee: &Coffee| {
        let mut coffee = coffee.clone();
        enrich_coffee(&mut coffee, today);
        coffee
    };

    let low_stock_coffees = coffees
        .iter()
        .filter(|coffee| is_low_stock(coffee))
        .map(&enriched)
        .collect();
    let aging_coffees = coffees
        .iter()
        .filter(|coffee| is_aging(coffee, today))
        .map(&enriched)
        .collect();

    let totals = owner_totals(roasters, coffees);
    let roasters = roasters
        .iter()
        .map(|roaster| Roaster {
            total_spent: totals.get(&roaster.id).copied().unwrap_or_default(),
            coffee_count: coffees
                .iter()
                .filter(|coffee| coffee.roaster_id == roaster.id)
                .count(),
            ..roaster.clone()
        })
        .collect();

    InventorySummary {
        total_weight,
        total_bags: coffees.len(),
        average_price_per_gram,
        total_spent,
        low_stock_coffees,
        aging_coffees,
        roasters,
    }
}
