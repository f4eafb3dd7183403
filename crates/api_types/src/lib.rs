use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier assigned by the backend to every owner and child record.
pub type Id = i64;

pub mod auth {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct LoginRequest {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct LoginResponse {
        pub token: String,
        /// Always `Bearer` for this backend.
        #[serde(rename = "type")]
        pub kind: String,
    }
}

pub mod person {
    use super::*;
    use crate::gift::Gift;

    /// Request body for creating or renaming a person.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PersonNew {
        pub name: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Person {
        pub id: Id,
        pub name: String,
        #[serde(default)]
        pub gifts: Vec<Gift>,
        /// Sum of the prices of `gifts`, computed by the backend.
        #[serde(default)]
        pub total_spent: Decimal,
    }
}

pub mod gift {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GiftNew {
        pub description: String,
        pub price: Decimal,
        pub person_id: Id,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Gift {
        pub id: Id,
        pub description: String,
        pub price: Decimal,
        pub person_id: Id,
        /// Denormalized copy of the owning person's name.
        #[serde(default)]
        pub person_name: String,
    }

    impl From<&Gift> for GiftNew {
        fn from(gift: &Gift) -> Self {
            Self {
                description: gift.description.clone(),
                price: gift.price,
                person_id: gift.person_id,
            }
        }
    }
}

pub mod budget {
    use super::*;
    use crate::person::Person;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetSummary {
        pub total_budget: Decimal,
        pub total_spent: Decimal,
        /// `total_budget - total_spent`, negative when over budget.
        pub remaining: Decimal,
        #[serde(default)]
        pub persons: Vec<Person>,
    }
}

pub mod roaster {
    use super::*;
    use crate::coffee::Coffee;

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RoasterNew {
        pub name: String,
        pub location: Option<String>,
        pub website: Option<String>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Roaster {
        pub id: Id,
        pub name: String,
        pub location: Option<String>,
        pub website: Option<String>,
        pub notes: Option<String>,
        #[serde(default)]
        pub coffees: Vec<Coffee>,
        #[serde(default)]
        pub total_spent: Decimal,
        #[serde(default)]
        pub coffee_count: usize,
    }

    impl From<&Roaster> for RoasterNew {
        fn from(roaster: &Roaster) -> Self {
            Self {
                name: roaster.name.clone(),
                location: roaster.location.clone(),
                website: roaster.website.clone(),
                notes: roaster.notes.clone(),
            }
        }
    }
}

pub mod coffee {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum RoastLevel {
        Light,
        MediumLight,
        Medium,
        MediumDark,
        Dark,
    }

    impl RoastLevel {
        pub fn label(self) -> &'static str {
            match self {
                Self::Light => "Light",
                Self::MediumLight => "Medium-Light",
                Self::Medium => "Medium",
                Self::MediumDark => "Medium-Dark",
                Self::Dark => "Dark",
            }
        }
    }

    impl std::str::FromStr for RoastLevel {
        type Err = String;

        /// Accepts `medium-light`, `Medium Light` or `MEDIUM_LIGHT`.
        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
            match normalized.as_str() {
                "LIGHT" => Ok(Self::Light),
                "MEDIUM_LIGHT" => Ok(Self::MediumLight),
                "MEDIUM" => Ok(Self::Medium),
                "MEDIUM_DARK" => Ok(Self::MediumDark),
                "DARK" => Ok(Self::Dark),
                _ => Err(format!("unknown roast level: {s}")),
            }
        }
    }

    /// Request body for creating or updating a coffee bag.
    ///
    /// Weights are in grams. When `current_weight` is omitted on creation the
    /// backend starts the bag full (`current_weight = initial_weight`).
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CoffeeNew {
        pub coffee_name: String,
        pub roast_date: NaiveDate,
        pub purchase_date: NaiveDate,
        pub initial_weight: Decimal,
        pub current_weight: Option<Decimal>,
        pub origin: Option<String>,
        pub roast_level: Option<RoastLevel>,
        pub processing_method: Option<String>,
        pub price: Option<Decimal>,
        pub notes: Option<String>,
        pub roaster_id: Id,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Coffee {
        pub id: Id,
        pub coffee_name: String,
        pub roast_date: NaiveDate,
        pub purchase_date: NaiveDate,
        pub initial_weight: Decimal,
        pub current_weight: Decimal,
        pub origin: Option<String>,
        pub roast_level: Option<RoastLevel>,
        pub processing_method: Option<String>,
        pub price: Option<Decimal>,
        pub notes: Option<String>,
        pub roaster_id: Id,
        #[serde(default)]
        pub roaster_name: String,
        /// Derived by the backend from `roast_date` and the current day.
        pub days_since_roast: Option<i64>,
        /// Derived by the backend, `0..=100`.
        pub percentage_remaining: Option<Decimal>,
    }

    impl From<&Coffee> for CoffeeNew {
        fn from(coffee: &Coffee) -> Self {
            Self {
                coffee_name: coffee.coffee_name.clone(),
                roast_date: coffee.roast_date,
                purchase_date: coffee.purchase_date,
                initial_weight: coffee.initial_weight,
                current_weight: Some(coffee.current_weight),
                origin: coffee.origin.clone(),
                roast_level: coffee.roast_level,
                processing_method: coffee.processing_method.clone(),
                price: coffee.price,
                notes: coffee.notes.clone(),
                roaster_id: coffee.roaster_id,
            }
        }
    }
}

pub mod inventory {
    use super::*;
    use crate::{coffee::Coffee, roaster::Roaster};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InventorySummary {
        /// Grams left across every bag.
        pub total_weight: Decimal,
        pub total_bags: usize,
        pub average_price_per_gram: Decimal,
        pub total_spent: Decimal,
        /// Bags with less than 20% of their initial weight left.
        #[serde(default)]
        pub low_stock_coffees: Vec<Coffee>,
        /// Bags roasted more than 30 days ago.
        #[serde(default)]
        pub aging_coffees: Vec<Coffee>,
        #[serde(default)]
        pub roasters: Vec<Roaster>,
    }
}
