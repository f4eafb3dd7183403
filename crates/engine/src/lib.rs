//! Aggregations over the owner/child lists of both trackers.
//!
//! The gift tracker groups [`Gift`]s under [`Person`]s, the coffee tracker
//! groups [`Coffee`] bags under [`Roaster`]s. Both are viewed through the
//! [`Owner`] and [`Child`] traits so totals are written once.
use std::collections::BTreeMap;

use api_types::{Id, coffee::Coffee, gift::Gift, person::Person, roaster::Roaster};
use rust_decimal::Decimal;

pub use amount::{Amount, parse_amount};
pub use budget::{DEFAULT_TOTAL_BUDGET, budget_summary};
pub use error::EngineError;
pub use inventory::{
    AGING_DAYS, LOW_STOCK_RATIO, consume, days_since_roast, enrich_coffee, inventory_summary,
    is_aging, is_low_stock, percentage_remaining, validate_coffee,
};

mod amount;
mod budget;
mod error;
mod inventory;

type ResultEngine<T> = Result<T, EngineError>;

/// Top-level record that groups children (a person or a roaster).
pub trait Owner {
    fn id(&self) -> Id;
    fn name(&self) -> &str;
}

/// Leaf record billed against an owner (a gift or a coffee bag).
pub trait Child {
    fn id(&self) -> Id;
    fn owner_id(&self) -> Id;
    fn label(&self) -> &str;
    /// `None` when the record carries no price.
    fn price(&self) -> Option<Decimal>;
}

impl Owner for Person {
    fn id(&self) -> Id {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Owner for Roaster {
    fn id(&self) -> Id {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Child for Gift {
    fn id(&self) -> Id {
        self.id
    }

    fn owner_id(&self) -> Id {
        self.person_id
    }

    fn label(&self) -> &str {
        &self.description
    }

    fn price(&self) -> Option<Decimal> {
        Some(self.price)
    }
}

impl Child for Coffee {
    fn id(&self) -> Id {
        self.id
    }

    fn owner_id(&self) -> Id {
        self.roaster_id
    }

    fn label(&self) -> &str {
        &self.coffee_name
    }

    fn price(&self) -> Option<Decimal> {
        self.price
    }
}

/// Sum of every known child price. Missing prices count as zero.
pub fn total_spent<C: Child>(children: &[C]) -> Decimal {
    children.iter().filter_map(|child| child.price()).sum()
}

/// Spent total per owner, keyed by owner id.
///
/// Every owner gets an entry (zero when it has no children). Children whose
/// owner is not in `owners` are left out.
pub fn owner_totals<O: Owner, C: Child>(owners: &[O], children: &[C]) -> BTreeMap<Id, Decimal> {
    let mut totals: BTreeMap<Id, Decimal> =
        owners.iter().map(|owner| (owner.id(), Decimal::ZERO)).collect();

    for child in children {
        if let Some(total) = totals.get_mut(&child.owner_id()) {
            *total += child.price().unwrap_or_default();
        }
    }

    totals
}

/// Children of `owner_id`, in list order.
pub fn children_of<C: Child>(children: &[C], owner_id: Id) -> Vec<&C> {
    children
        .iter()
        .filter(|child| child.owner_id() == owner_id)
        .collect()
}

/// Ensure every child references an owner present in `owners`.
pub fn validate_children<O: Owner, C: Child>(owners: &[O], children: &[C]) -> ResultEngine<()> {
    for child in children {
        if !owners.iter().any(|owner| owner.id() == child.owner_id()) {
            return Err(EngineError::UnknownOwner {
                child: child.id(),
                owner: child.owner_id(),
            });
        }
    }
    Ok(())
}
