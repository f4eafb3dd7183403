//! The two front ends as instances of one owner/child/summary capability set.

use std::fmt::Debug;

use api_types::{
    budget::BudgetSummary,
    coffee::{Coffee, CoffeeNew},
    gift::{Gift, GiftNew},
    inventory::InventorySummary,
    person::{Person, PersonNew},
    roaster::{Roaster, RoasterNew},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Serialize, de::DeserializeOwned};

/// Resources and summary of one tracker variant.
///
/// Paths are relative to the API base URL.
pub trait Tracker: Debug + Send + Sync + 'static {
    type Owner: engine::Owner + DeserializeOwned + Clone + Debug + Send;
    type OwnerInput: Serialize + Debug + Send + Sync;
    type Child: engine::Child + DeserializeOwned + Clone + Debug + Send;
    type ChildInput: Serialize + Debug + Send + Sync;
    type Summary: DeserializeOwned + Clone + Debug + Send;
    type SummaryParams: Clone + Debug + Default + Send + Sync;

    /// Owner collection, e.g. `persons`.
    const OWNERS: &'static str;
    /// Child collection, e.g. `gifts`.
    const CHILDREN: &'static str;
    /// Segment listing the children of one owner: `{CHILDREN}/{OWNER_SCOPE}/{id}`.
    const OWNER_SCOPE: &'static str;
    const SUMMARY: &'static str;

    /// Singular nouns used in notices and prompts.
    const OWNER_NOUN: &'static str;
    const CHILD_NOUN: &'static str;

    fn summary_query(params: &Self::SummaryParams) -> Vec<(&'static str, String)>;

    /// Summary recomputed from the lists, without the backend.
    fn compute_summary(
        owners: &[Self::Owner],
        children: &[Self::Child],
        params: &Self::SummaryParams,
        today: NaiveDate,
    ) -> Self::Summary;

    /// Describe the first headline figure where two summaries disagree.
    fn drift(local: &Self::Summary, remote: &Self::Summary) -> Option<String>;
}

fn compare(label: &str, local: Decimal, remote: Decimal) -> Option<String> {
    (local != remote).then(|| format!("{label}: local {local}, backend {remote}"))
}

/// Gift tracker: persons, gifts and a budget.
#[derive(Debug, Clone, Copy)]
pub struct GiftTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetParams {
    pub total_budget: Decimal,
}

impl Default for BudgetParams {
    fn default() -> Self {
        Self {
            total_budget: engine::DEFAULT_TOTAL_BUDGET,
        }
    }
}

impl Tracker for GiftTracker {
    type Owner = Person;
    type OwnerInput = PersonNew;
    type Child = Gift;
    type ChildInput = GiftNew;
    type Summary = BudgetSummary;
    type SummaryParams = BudgetParams;

    const OWNERS: &'static str = "persons";
    const CHILDREN: &'static str = "gifts";
    const OWNER_SCOPE: &'static str = "person";
    const SUMMARY: &'static str = "budget/summary";

    const OWNER_NOUN: &'static str = "person";
    const CHILD_NOUN: &'static str = "gift";

    fn summary_query(params: &BudgetParams) -> Vec<(&'static str, String)> {
        vec![("totalBudget", params.total_budget.to_string())]
    }

    fn compute_summary(
        owners: &[Person],
        children: &[Gift],
        params: &BudgetParams,
        _today: NaiveDate,
    ) -> BudgetSummary {
        engine::budget_summary(owners, children, params.total_budget)
    }

    fn drift(local: &BudgetSummary, remote: &BudgetSummary) -> Option<String> {
        compare("totalSpent", local.total_spent, remote.total_spent)
            .or_else(|| compare("remaining", local.remaining, remote.remaining))
    }
}

/// Coffee tracker: roasters, coffee bags and an inventory.
#[derive(Debug, Clone, Copy)]
pub struct CoffeeTracker;

impl Tracker for CoffeeTracker {
    type Owner = Roaster;
    type OwnerInput = RoasterNew;
    type Child = Coffee;
    type ChildInput = CoffeeNew;
    type Summary = InventorySummary;
    type SummaryParams = ();

    const OWNERS: &'static str = "roasters";
    const CHILDREN: &'static str = "coffees";
    const OWNER_SCOPE: &'static str = "roaster";
    const SUMMARY: &'static str = "inventory/summary";

    const OWNER_NOUN: &'static str = "roaster";
    const CHILD_NOUN: &'static str = "coffee";

    fn summary_query(_params: &()) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn compute_summary(
        owners: &[Roaster],
        children: &[Coffee],
        _params: &(),
        today: NaiveDate,
    ) -> InventorySummary {
        engine::inventory_summary(owners, children, today)
    }

    fn drift(local: &InventorySummary, remote: &InventorySummary) -> Option<String> {
        if local.total_bags != remote.total_bags {
            return Some(format!(
                "totalBags: local {}, backend {}",
                local.total_bags, remote.total_bags
            ));
        }
        compare("totalWeight", local.total_weight, remote.total_weight)
            .or_else(|| compare("totalSpent", local.total_spent, remote.total_spent))
    }
}
