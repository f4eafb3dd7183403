use std::sync::Arc;

use api_types::{
    Id,
    coffee::{CoffeeNew, RoastLevel},
    gift::GiftNew,
    person::PersonNew,
    roaster::RoasterNew,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use client::{
    BudgetParams, Client, CoffeeTracker, Controller, FileTokenStore, GiftTracker, NoticeLevel,
    Outcome, Screen, Tracker,
};
use rust_decimal::Decimal;

use crate::{
    config::{AppConfig, ConfigArgs},
    error::{AppError, Result},
    prompt, ui,
};

#[derive(Debug, Parser)]
#[command(name = "tracker")]
#[command(about = "Gift budget and coffee inventory tracker")]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session token.
    Login {
        #[arg(long)]
        username: Option<String>,
    },
    /// Forget the stored session token.
    Logout,
    /// Persons, gifts and the gift budget.
    Gifts {
        #[command(subcommand)]
        command: GiftsCommand,
    },
    /// Roasters, coffee bags and the inventory.
    Coffee {
        #[command(subcommand)]
        command: CoffeeCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum GiftsCommand {
    /// Budget summary and gifts grouped by person.
    Show {
        /// Total budget to compare spending against.
        #[arg(long, value_parser = parse_decimal)]
        budget: Option<Decimal>,
    },
    #[command(subcommand)]
    Owner(PersonCommand),
    #[command(subcommand)]
    Item(GiftCommand),
}

#[derive(Debug, Subcommand)]
pub enum PersonCommand {
    Add {
        name: String,
    },
    Edit {
        id: Id,
        name: String,
    },
    /// Delete a person together with all their gifts.
    Rm {
        id: Id,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum GiftCommand {
    Add {
        #[arg(long)]
        person: Id,
        #[arg(long)]
        description: String,
        #[arg(long, value_parser = parse_decimal)]
        price: Decimal,
    },
    Edit {
        id: Id,
        #[arg(long)]
        person: Option<Id>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_decimal)]
        price: Option<Decimal>,
    },
    Rm {
        id: Id,
        #[arg(long)]
        yes: bool,
    },
    List {
        /// Only the gifts of this person.
        #[arg(long)]
        person: Option<Id>,
    },
}

#[derive(Debug, Subcommand)]
pub enum CoffeeCommand {
    /// Inventory summary and bags grouped by roaster.
    Show,
    #[command(subcommand)]
    Owner(RoasterCommand),
    #[command(subcommand)]
    Item(BagCommand),
    /// Record grams drunk from a bag.
    Consume {
        #[arg(long)]
        id: Id,
        #[arg(long, value_parser = parse_decimal)]
        amount: Decimal,
    },
}

#[derive(Debug, Args)]
pub struct RoasterFields {
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    website: Option<String>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum RoasterCommand {
    Add {
        name: String,
        #[command(flatten)]
        fields: RoasterFields,
    },
    Edit {
        id: Id,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: RoasterFields,
    },
    /// Delete a roaster together with all its coffees.
    Rm {
        id: Id,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Args)]
pub struct BagFields {
    #[arg(long)]
    origin: Option<String>,
    /// light, medium-light, medium, medium-dark or dark.
    #[arg(long)]
    roast_level: Option<RoastLevel>,
    #[arg(long)]
    process: Option<String>,
    #[arg(long, value_parser = parse_decimal)]
    price: Option<Decimal>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum BagCommand {
    Add {
        #[arg(long)]
        roaster: Id,
        #[arg(long)]
        name: String,
        /// YYYY-MM-DD.
        #[arg(long)]
        roast_date: NaiveDate,
        /// YYYY-MM-DD, today when omitted.
        #[arg(long)]
        purchase_date: Option<NaiveDate>,
        /// Initial weight in grams.
        #[arg(long, value_parser = parse_decimal)]
        weight: Decimal,
        /// Grams left, the full bag when omitted.
        #[arg(long, value_parser = parse_decimal)]
        current: Option<Decimal>,
        #[command(flatten)]
        fields: BagFields,
    },
    Edit {
        id: Id,
        #[arg(long)]
        roaster: Option<Id>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        roast_date: Option<NaiveDate>,
        #[arg(long)]
        purchase_date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_decimal)]
        weight: Option<Decimal>,
        #[arg(long, value_parser = parse_decimal)]
        current: Option<Decimal>,
        #[command(flatten)]
        fields: BagFields,
    },
    Rm {
        id: Id,
        #[arg(long)]
        yes: bool,
    },
    List {
        /// Only the coffees of this roaster.
        #[arg(long)]
        roaster: Option<Id>,
    },
}

fn parse_decimal(raw: &str) -> std::result::Result<Decimal, String> {
    engine::parse_amount(raw).map_err(|err| err.to_string())
}

pub async fn run(command: Command, config: AppConfig) -> Result<()> {
    let tokens = Arc::new(FileTokenStore::new(&config.token_path));
    let client = Client::new(&config.base_url, tokens)?;

    match command {
        Command::Login { username } => {
            let (username, password) = credentials(&config, username)?;
            client.login(&username, &password).await?;
            println!("Signed in as {username}.");
            Ok(())
        }
        Command::Logout => {
            client.logout()?;
            println!("Signed out.");
            Ok(())
        }
        Command::Gifts { command } => gifts(client, &config, command).await,
        Command::Coffee { command } => coffee(client, &config, command).await,
    }
}

fn credentials(config: &AppConfig, username: Option<String>) -> Result<(String, String)> {
    let username = match username {
        Some(username) => username,
        None if !config.username.is_empty() => config.username.clone(),
        None => prompt::read_line("Username: ")?,
    };
    let password = prompt::password("Password: ")?;
    Ok((username, password))
}

fn failure<V: Tracker>(controller: &Controller<V>) -> AppError {
    let message = controller
        .state
        .notice
        .as_ref()
        .map(|notice| notice.message.clone())
        .unwrap_or_else(|| "action failed".to_string());
    AppError::Action(message)
}

/// Load the tracker, signing in first when no valid session is stored.
async fn open<V: Tracker>(
    client: Client,
    params: V::SummaryParams,
    config: &AppConfig,
) -> Result<Controller<V>> {
    let mut controller = Controller::<V>::new(client, params);
    controller.start().await;

    if controller.state.screen == Screen::Login {
        if let Some(notice) = &controller.state.notice {
            eprintln!("{}", ui::notice(notice));
        }
        let (username, password) = credentials(config, None)?;
        controller.login(&username, &password).await;
    }

    match &controller.state.notice {
        Some(notice) if notice.level == NoticeLevel::Error => Err(failure(&controller)),
        _ => Ok(controller),
    }
}

fn report<V: Tracker>(controller: &Controller<V>, outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::Applied => {
            if let Some(notice) = &controller.state.notice {
                println!("{}", ui::notice(notice));
            }
            Ok(())
        }
        Outcome::Declined => {
            println!("Cancelled.");
            Ok(())
        }
        Outcome::Stale | Outcome::Failed => Err(failure(controller)),
    }
}

fn not_loaded(noun: &str, id: Id) -> AppError {
    AppError::Action(format!("No {noun} with id {id}"))
}

async fn gifts(client: Client, config: &AppConfig, command: GiftsCommand) -> Result<()> {
    let params = BudgetParams {
        total_budget: config.total_budget,
    };
    let mut controller = open::<GiftTracker>(client, params, config).await?;

    let outcome = match command {
        GiftsCommand::Show { budget } => {
            if let Some(total_budget) = budget
                && !controller
                    .set_summary_params(BudgetParams { total_budget })
                    .await
            {
                return Err(failure(&controller));
            }
            if let Some(summary) = &controller.state.summary {
                println!(
                    "{}",
                    ui::render_budget(summary, &controller.state.owners, &controller.state.children)
                );
            }
            return Ok(());
        }
        GiftsCommand::Owner(PersonCommand::Add { name }) => {
            controller.create_owner(PersonNew { name }).await
        }
        GiftsCommand::Owner(PersonCommand::Edit { id, name }) => {
            controller.update_owner(id, PersonNew { name }).await
        }
        GiftsCommand::Owner(PersonCommand::Rm { id, yes }) => {
            controller
                .delete_owner(id, &mut |question: &str| prompt::confirm(question, yes))
                .await
        }
        GiftsCommand::Item(GiftCommand::Add {
            person,
            description,
            price,
        }) => {
            controller
                .create_child(GiftNew {
                    description,
                    price,
                    person_id: person,
                })
                .await
        }
        GiftsCommand::Item(GiftCommand::Edit {
            id,
            person,
            description,
            price,
        }) => {
            let current = controller
                .child(id)
                .ok_or_else(|| not_loaded(GiftTracker::CHILD_NOUN, id))?;
            let mut input = GiftNew::from(current);
            if let Some(person) = person {
                input.person_id = person;
            }
            if let Some(description) = description {
                input.description = description;
            }
            if let Some(price) = price {
                input.price = price;
            }
            controller.update_child(id, input).await
        }
        GiftsCommand::Item(GiftCommand::Rm { id, yes }) => {
            controller
                .delete_child(id, &mut |question: &str| prompt::confirm(question, yes))
                .await
        }
        GiftsCommand::Item(GiftCommand::List { person }) => {
            let gifts = match person {
                Some(person) => {
                    controller
                        .client()
                        .list_children_of::<GiftTracker>(person)
                        .await?
                }
                None => controller.state.children.clone(),
            };
            for gift in &gifts {
                println!("{}  {}", ui::gift_line(gift), gift.person_name);
            }
            return Ok(());
        }
    };

    report(&controller, outcome)
}

async fn coffee(client: Client, config: &AppConfig, command: CoffeeCommand) -> Result<()> {
    let mut controller = open::<CoffeeTracker>(client, (), config).await?;
    let today = chrono::Local::now().date_naive();

    let outcome = match command {
        CoffeeCommand::Show => {
            if let Some(summary) = &controller.state.summary {
                println!(
                    "{}",
                    ui::render_inventory(
                        summary,
                        &controller.state.owners,
                        &controller.state.children,
                        today
                    )
                );
            }
            return Ok(());
        }
        CoffeeCommand::Owner(RoasterCommand::Add { name, fields }) => {
            controller
                .create_owner(RoasterNew {
                    name,
                    location: fields.location,
                    website: fields.website,
                    notes: fields.notes,
                })
                .await
        }
        CoffeeCommand::Owner(RoasterCommand::Edit { id, name, fields }) => {
            let current = controller
                .owner(id)
                .ok_or_else(|| not_loaded(CoffeeTracker::OWNER_NOUN, id))?;
            let mut input = RoasterNew::from(current);
            if let Some(name) = name {
                input.name = name;
            }
            if fields.location.is_some() {
                input.location = fields.location;
            }
            if fields.website.is_some() {
                input.website = fields.website;
            }
            if fields.notes.is_some() {
                input.notes = fields.notes;
            }
            controller.update_owner(id, input).await
        }
        CoffeeCommand::Owner(RoasterCommand::Rm { id, yes }) => {
            controller
                .delete_owner(id, &mut |question: &str| prompt::confirm(question, yes))
                .await
        }
        CoffeeCommand::Item(BagCommand::Add {
            roaster,
            name,
            roast_date,
            purchase_date,
            weight,
            current,
            fields,
        }) => {
            controller
                .create_child(CoffeeNew {
                    coffee_name: name,
                    roast_date,
                    purchase_date: purchase_date.unwrap_or(today),
                    initial_weight: weight,
                    current_weight: current,
                    origin: fields.origin,
                    roast_level: fields.roast_level,
                    processing_method: fields.process,
                    price: fields.price,
                    notes: fields.notes,
                    roaster_id: roaster,
                })
                .await
        }
        CoffeeCommand::Item(BagCommand::Edit {
            id,
            roaster,
            name,
            roast_date,
            purchase_date,
            weight,
            current,
            fields,
        }) => {
            let existing = controller
                .child(id)
                .ok_or_else(|| not_loaded(CoffeeTracker::CHILD_NOUN, id))?;
            let mut input = CoffeeNew::from(existing);
            if let Some(roaster) = roaster {
                input.roaster_id = roaster;
            }
            if let Some(name) = name {
                input.coffee_name = name;
            }
            if let Some(roast_date) = roast_date {
                input.roast_date = roast_date;
            }
            if let Some(purchase_date) = purchase_date {
                input.purchase_date = purchase_date;
            }
            if let Some(weight) = weight {
                input.initial_weight = weight;
            }
            if current.is_some() {
                input.current_weight = current;
            }
            if fields.origin.is_some() {
                input.origin = fields.origin;
            }
            if fields.roast_level.is_some() {
                input.roast_level = fields.roast_level;
            }
            if fields.process.is_some() {
                input.processing_method = fields.process;
            }
            if fields.price.is_some() {
                input.price = fields.price;
            }
            if fields.notes.is_some() {
                input.notes = fields.notes;
            }
            controller.update_child(id, input).await
        }
        CoffeeCommand::Item(BagCommand::Rm { id, yes }) => {
            controller
                .delete_child(id, &mut |question: &str| prompt::confirm(question, yes))
                .await
        }
        CoffeeCommand::Item(BagCommand::List { roaster }) => {
            let coffees = match roaster {
                Some(roaster) => {
                    controller
                        .client()
                        .list_children_of::<CoffeeTracker>(roaster)
                        .await?
                }
                None => controller.state.children.clone(),
            };
            for coffee in &coffees {
                println!(
                    "{}  {}",
                    ui::coffee_line(coffee, today),
                    coffee.roaster_name
                );
            }
            return Ok(());
        }
        CoffeeCommand::Consume { id, amount } => controller.consume(id, amount).await,
    };

    report(&controller, outcome)
}
