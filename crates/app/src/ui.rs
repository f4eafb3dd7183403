//! Plain-text rendering of tracker state.

use api_types::{
    budget::BudgetSummary, coffee::Coffee, gift::Gift, inventory::InventorySummary,
    person::Person, roaster::Roaster,
};
use chrono::NaiveDate;
use client::{Notice, NoticeLevel};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

const BAR_WIDTH: usize = 20;

/// `$1,234.50`, `-$50.00`.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (units, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    format!("{sign}${}.{cents}", group_thousands(units))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_grams(grams: Decimal) -> String {
    format!("{}g", grams.normalize())
}

/// Text progress bar like `███████░░░ 70%`, or `━━━━` when there is no cap.
pub fn inline_progress_bar(current: Decimal, cap: Decimal, width: usize) -> String {
    if cap <= Decimal::ZERO {
        return "━".repeat(width);
    }
    let ratio = current
        .checked_div(cap)
        .unwrap_or(Decimal::ONE)
        .clamp(Decimal::ZERO, Decimal::ONE);
    let filled = (ratio * Decimal::from(width))
        .floor()
        .to_usize()
        .unwrap_or_default()
        .min(width);
    let percentage = (ratio * Decimal::ONE_HUNDRED).floor();

    format!(
        "{}{} {}%",
        "█".repeat(filled),
        "░".repeat(width - filled),
        percentage
    )
}

pub fn notice(notice: &Notice) -> String {
    let prefix = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Error => "error",
    };
    format!("[{prefix}] {}", notice.message)
}

pub fn gift_line(gift: &Gift) -> String {
    format!(
        "#{:<4} {:<30} {:>12}",
        gift.id,
        gift.description,
        format_currency(gift.price)
    )
}

pub fn render_budget(summary: &BudgetSummary, persons: &[Person], gifts: &[Gift]) -> String {
    let mut lines = vec![
        format!("Budget     {:>12}", format_currency(summary.total_budget)),
        format!("Spent      {:>12}", format_currency(summary.total_spent)),
        format!("Remaining  {:>12}", format_currency(summary.remaining)),
        inline_progress_bar(summary.total_spent, summary.total_budget, BAR_WIDTH),
    ];
    if summary.remaining < Decimal::ZERO {
        lines.push(format!(
            "Over budget by {}",
            format_currency(-summary.remaining)
        ));
    }

    let totals = engine::owner_totals(persons, gifts);
    for person in persons {
        lines.push(String::new());
        lines.push(format!(
            "{} (#{})  {}",
            person.name,
            person.id,
            format_currency(totals.get(&person.id).copied().unwrap_or_default())
        ));
        let owned = engine::children_of(gifts, person.id);
        if owned.is_empty() {
            lines.push("  no gifts yet".to_string());
        }
        lines.extend(owned.into_iter().map(|gift| format!("  {}", gift_line(gift))));
    }

    lines.join("\n")
}

fn remaining_share(coffee: &Coffee) -> Option<Decimal> {
    coffee
        .percentage_remaining
        .or_else(|| engine::percentage_remaining(coffee.initial_weight, coffee.current_weight))
}

pub fn coffee_line(coffee: &Coffee, today: NaiveDate) -> String {
    let days = coffee
        .days_since_roast
        .unwrap_or_else(|| engine::days_since_roast(coffee.roast_date, today));
    let roast = coffee.roast_level.map(|level| level.label()).unwrap_or("-");
    let bar = inline_progress_bar(coffee.current_weight, coffee.initial_weight, 10);
    let mut flags = Vec::new();
    if engine::is_low_stock(coffee) {
        flags.push("low");
    }
    if engine::is_aging(coffee, today) {
        flags.push("aging");
    }

    format!(
        "#{:<4} {:<24} {:<12} {:>6}/{:<6} {}  {}d{}",
        coffee.id,
        coffee.coffee_name,
        roast,
        format_grams(coffee.current_weight),
        format_grams(coffee.initial_weight),
        bar,
        days,
        if flags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", flags.join(", "))
        }
    )
}

pub fn render_inventory(
    summary: &InventorySummary,
    roasters: &[Roaster],
    coffees: &[Coffee],
    today: NaiveDate,
) -> String {
    let mut lines = vec![
        format!("Bags       {:>12}", summary.total_bags),
        format!("Weight     {:>12}", format_grams(summary.total_weight)),
        format!("Spent      {:>12}", format_currency(summary.total_spent)),
        format!(
            "Avg price  {:>12}",
            format!("${}/g", summary.average_price_per_gram.normalize())
        ),
    ];

    let totals = engine::owner_totals(roasters, coffees);
    for roaster in roasters {
        let owned = engine::children_of(coffees, roaster.id);
        lines.push(String::new());
        lines.push(format!(
            "{} (#{})  {} bags  {}",
            roaster.name,
            roaster.id,
            owned.len(),
            format_currency(totals.get(&roaster.id).copied().unwrap_or_default())
        ));
        if let Some(location) = &roaster.location {
            lines.push(format!("  {location}"));
        }
        lines.extend(
            owned
                .into_iter()
                .map(|coffee| format!("  {}", coffee_line(coffee, today))),
        );
    }

    if !summary.low_stock_coffees.is_empty() {
        lines.push(String::new());
        lines.push("Low stock".to_string());
        lines.extend(summary.low_stock_coffees.iter().map(|coffee| {
            let share = remaining_share(coffee)
                .map(|share| format!(" ({}%)", share.round_dp(1).normalize()))
                .unwrap_or_default();
            format!(
                "  #{} {}  {} left{share}",
                coffee.id,
                coffee.coffee_name,
                format_grams(coffee.current_weight)
            )
        }));
    }

    if !summary.aging_coffees.is_empty() {
        lines.push(String::new());
        lines.push("Aging".to_string());
        lines.extend(summary.aging_coffees.iter().map(|coffee| {
            let days = coffee
                .days_since_roast
                .unwrap_or_else(|| engine::days_since_roast(coffee.roast_date, today));
            format!(
                "  #{} {}  roasted {days} days ago",
                coffee.id, coffee.coffee_name
            )
        }));
    }

    lines.join("\n")
}
