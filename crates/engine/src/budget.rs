use api_types::{budget::BudgetSummary, gift::Gift, person::Person};
use rust_decimal::Decimal;

use crate::{owner_totals, total_spent};

/// Budget used when the caller does not pick one.
pub const DEFAULT_TOTAL_BUDGET: Decimal = Decimal::ONE_THOUSAND;

/// Compute the budget summary for the gift tracker.
///
/// `remaining` goes negative once the gifts cost more than `total_budget`.
/// The returned persons carry their refreshed spent totals.
pub fn budget_summary(persons: &[Person], gifts: &[Gift], total_budget: Decimal) -> BudgetSummary {
    let totals = owner_totals(persons, gifts);
    let total_spent = total_spent(gifts);

    let persons = persons
        .iter()
        .map(|person| Person {
            total_spent: totals.get(&person.id).copied().unwrap_or_default(),
            ..person.clone()
        })
        .collect();

    BudgetSummary {
        total_budget,
        total_spent,
        remaining: total_budget - total_spent,
        persons,
    }
}
