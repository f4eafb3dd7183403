//! In-memory state of one tracker and the actions that change it.
//!
//! The controller never patches its lists by hand: after every successful
//! mutation it fetches owners, children and summary again. A failed call
//! leaves the lists untouched and sets a [`Notice`].

use std::collections::BTreeMap;

use api_types::Id;
use engine::{Child, Owner};
use rust_decimal::Decimal;

use crate::{Client, ClientError, CoffeeTracker, Tracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Home,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Message shown to the user after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Result of a user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The backend accepted the call and the lists were reloaded.
    Applied,
    /// The backend accepted the call but the reload after it failed, the
    /// lists predate the change.
    Stale,
    /// The user did not confirm, nothing was sent.
    Declined,
    /// The call failed, state is unchanged.
    Failed,
}

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug)]
pub struct TrackerState<V: Tracker> {
    pub screen: Screen,
    pub owners: Vec<V::Owner>,
    pub children: Vec<V::Child>,
    pub summary: Option<V::Summary>,
    /// Set while [`Controller::reload`] awaits its reads. The controller is
    /// borrowed mutably for that whole time, so only a UI that draws between
    /// polls of the reload future observes it as `true`.
    pub loading: bool,
    pub notice: Option<Notice>,
}

impl<V: Tracker> Default for TrackerState<V> {
    fn default() -> Self {
        Self {
            screen: Screen::Login,
            owners: Vec::new(),
            children: Vec::new(),
            summary: None,
            loading: false,
            notice: None,
        }
    }
}

#[derive(Debug)]
pub struct Controller<V: Tracker> {
    client: Client,
    params: V::SummaryParams,
    pub state: TrackerState<V>,
}

impl<V: Tracker> Controller<V> {
    pub fn new(client: Client, params: V::SummaryParams) -> Self {
        Self {
            client,
            params,
            state: TrackerState::default(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn params(&self) -> &V::SummaryParams {
        &self.params
    }

    /// Show the login screen when no token is stored, load everything
    /// otherwise.
    pub async fn start(&mut self) {
        match self.client.is_authenticated() {
            Ok(true) => {
                self.state.screen = Screen::Home;
                self.reload().await;
            }
            Ok(false) => self.state.screen = Screen::Login,
            Err(err) => {
                tracing::error!("failed to read stored token: {err}");
                self.state.screen = Screen::Login;
            }
        }
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Outcome {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            self.state.notice = Some(Notice::error("Fill in username and password."));
            return Outcome::Failed;
        }

        match self.client.login(username, password).await {
            Ok(_) => {
                self.state.screen = Screen::Home;
                self.state.notice = None;
                self.reload().await;
                Outcome::Applied
            }
            Err(err) => {
                tracing::debug!("login failed: {err}");
                self.state.notice = Some(Notice::error(login_message_for_error(&err)));
                Outcome::Failed
            }
        }
    }

    pub fn logout(&mut self) {
        if let Err(err) = self.client.logout() {
            tracing::error!("failed to clear stored token: {err}");
        }
        self.state = TrackerState::default();
    }

    /// Fetch owners, children and summary concurrently.
    ///
    /// Returns `false` if any of the three reads failed; the previous lists
    /// are kept in that case.
    pub async fn reload(&mut self) -> bool {
        self.state.loading = true;
        let result = tokio::try_join!(
            self.client.list_owners::<V>(),
            self.client.list_children::<V>(),
            self.client.summary::<V>(&self.params),
        );
        self.state.loading = false;

        match result {
            Ok((owners, children, summary)) => {
                self.check_consistency(&owners, &children, &summary);
                self.state.owners = owners;
                self.state.children = children;
                self.state.summary = Some(summary);
                true
            }
            Err(err) => {
                self.fail("Error loading data", err);
                false
            }
        }
    }

    /// Switch summary parameters (e.g. the total budget) and reload.
    pub async fn set_summary_params(&mut self, params: V::SummaryParams) -> bool {
        self.params = params;
        self.reload().await
    }

    pub async fn create_owner(&mut self, input: V::OwnerInput) -> Outcome {
        let result = self.client.create_owner::<V>(&input).await.map(|_| ());
        self.finish(result, "creating", V::OWNER_NOUN).await
    }

    pub async fn update_owner(&mut self, id: Id, input: V::OwnerInput) -> Outcome {
        let result = self.client.update_owner::<V>(id, &input).await.map(|_| ());
        self.finish(result, "updating", V::OWNER_NOUN).await
    }

    /// Delete an owner and, server-side, all its children. Nothing is sent
    /// unless `confirm` agrees.
    pub async fn delete_owner(&mut self, id: Id, confirm: &mut impl Confirm) -> Outcome {
        let prompt = match self.state.owners.iter().find(|owner| owner.id() == id) {
            Some(owner) => format!(
                "Are you sure you want to delete {} and all their {}s?",
                owner.name(),
                V::CHILD_NOUN
            ),
            None => format!(
                "Are you sure you want to delete this {} and all their {}s?",
                V::OWNER_NOUN,
                V::CHILD_NOUN
            ),
        };
        if !confirm.confirm(&prompt) {
            tracing::debug!("deletion of {} {id} declined", V::OWNER_NOUN);
            return Outcome::Declined;
        }

        let result = self.client.delete_owner::<V>(id).await;
        self.finish(result, "deleting", V::OWNER_NOUN).await
    }

    pub async fn create_child(&mut self, input: V::ChildInput) -> Outcome {
        let result = self.client.create_child::<V>(&input).await.map(|_| ());
        self.finish(result, "creating", V::CHILD_NOUN).await
    }

    pub async fn update_child(&mut self, id: Id, input: V::ChildInput) -> Outcome {
        let result = self.client.update_child::<V>(id, &input).await.map(|_| ());
        self.finish(result, "updating", V::CHILD_NOUN).await
    }

    pub async fn delete_child(&mut self, id: Id, confirm: &mut impl Confirm) -> Outcome {
        let prompt = format!("Are you sure you want to delete this {}?", V::CHILD_NOUN);
        if !confirm.confirm(&prompt) {
            tracing::debug!("deletion of {} {id} declined", V::CHILD_NOUN);
            return Outcome::Declined;
        }

        let result = self.client.delete_child::<V>(id).await;
        self.finish(result, "deleting", V::CHILD_NOUN).await
    }

    pub fn owner(&self, id: Id) -> Option<&V::Owner> {
        self.state.owners.iter().find(|owner| owner.id() == id)
    }

    pub fn child(&self, id: Id) -> Option<&V::Child> {
        self.state.children.iter().find(|child| child.id() == id)
    }

    pub fn children_of(&self, owner_id: Id) -> Vec<&V::Child> {
        engine::children_of(&self.state.children, owner_id)
    }

    /// Spent total per owner, from the loaded children.
    pub fn owner_totals(&self) -> BTreeMap<Id, Decimal> {
        engine::owner_totals(&self.state.owners, &self.state.children)
    }

    async fn finish(
        &mut self,
        result: Result<(), ClientError>,
        verb: &str,
        noun: &str,
    ) -> Outcome {
        match result {
            Ok(()) => {
                if self.reload().await {
                    self.state.notice = Some(Notice::success(format!("Done {verb} {noun}")));
                    Outcome::Applied
                } else {
                    tracing::warn!("{verb} {noun} succeeded but the reload after it failed");
                    Outcome::Stale
                }
            }
            Err(err) => {
                self.fail(&format!("Error {verb} {noun}"), err);
                Outcome::Failed
            }
        }
    }

    fn fail(&mut self, action: &str, err: ClientError) {
        if err.is_unauthorized() {
            tracing::warn!("{action}: session expired");
            self.state = TrackerState::default();
            self.state.notice = Some(Notice::error("Session expired, please sign in again."));
            return;
        }
        tracing::error!("{action}: {err}");
        self.state.notice = Some(Notice::error(action));
    }

    fn check_consistency(
        &self,
        owners: &[V::Owner],
        children: &[V::Child],
        summary: &V::Summary,
    ) {
        if let Err(err) = engine::validate_children(owners, children) {
            tracing::warn!("inconsistent lists from backend: {err}");
        }
        let today = chrono::Local::now().date_naive();
        let local = V::compute_summary(owners, children, &self.params, today);
        if let Some(drift) = V::drift(&local, summary) {
            tracing::warn!("backend summary differs from local computation, {drift}");
        }
    }
}

impl Controller<CoffeeTracker> {
    /// Drink `amount` grams from a bag.
    ///
    /// Amounts the loaded state already shows as impossible are refused
    /// without calling the backend.
    pub async fn consume(&mut self, id: Id, amount: Decimal) -> Outcome {
        if let Some(coffee) = self.child(id)
            && let Err(err) = engine::consume(coffee, amount)
        {
            tracing::warn!("refusing to consume {amount}g from coffee {id}: {err}");
            self.state.notice = Some(Notice::error(err.to_string()));
            return Outcome::Failed;
        }

        let result = self.client.consume_coffee(id, amount).await.map(|_| ());
        self.finish(result, "consuming", CoffeeTracker::CHILD_NOUN)
            .await
    }
}

fn login_message_for_error(err: &ClientError) -> String {
    match err {
        ClientError::Unauthorized | ClientError::Forbidden => {
            "Wrong username or password.".to_string()
        }
        ClientError::NotFound => "Login endpoint not found, check base_url.".to_string(),
        ClientError::Conflict(message) | ClientError::Validation(message) => {
            format!("Validation error: {message}")
        }
        ClientError::Server(message) => format!("Server error: {message}"),
        ClientError::Transport(err) => format!("Server unreachable: {err}"),
        ClientError::InvalidUrl(message) => format!("Invalid base_url: {message}"),
        ClientError::Io(err) => format!("Cannot store token: {err}"),
        ClientError::Json(err) => format!("Cannot store token: {err}"),
    }
}
