//! Per-entity pages: the session, list loader, mutation controller and
//! confirmation gate wired together for one backend resource.
//!
//! - `accounts`: members and coaches (lock, unlock, ban)
//! - `packages`: package CRUD and the optimistic status toggle
//! - `orders`: order and payment status
//! - `reviews`: moderation and client review submission
//! - `rooms`: rooms and facilities
//! - `portal`: the client's own orders
//! - `public`: the anonymous package feed
//! - `dashboard`: summary figures over loaded collections

pub mod accounts;
pub mod dashboard;
pub mod orders;
pub mod packages;
pub mod portal;
pub mod public;
pub mod reviews;
pub mod rooms;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::endpoints::ResourcePaths;
use crate::api::{ApiError, Scope};
use crate::confirm::{ConfirmPrompt, ConfirmationGate, Decider, GateError, GateOutcome};
use crate::loader::{Collection, FilterCriteria, Filterable, ListLoader, ListQuery, ListView};
use crate::models::{Entity, EntityId};
use crate::mutation::{MutationController, MutationError};
use crate::session::SessionGuard;

/// How a record is named in confirmation prompts.
pub trait Labelled {
    /// Vietnamese noun for the record type, e.g. "hội viên"
    const NOUN: &'static str;

    fn label(&self) -> String;
}

pub struct Resource<T> {
    session: Arc<SessionGuard>,
    loader: ListLoader<T>,
    controller: MutationController<T>,
    gate: ConfirmationGate,
}

impl<T> Resource<T>
where
    T: Entity + DeserializeOwned + Filterable + Labelled,
{
    pub fn new(session: Arc<SessionGuard>, paths: ResourcePaths) -> Self {
        Self::with_list_path(session, paths, paths.list())
    }

    /// Same actions, but the list comes from `list_path` (e.g. the coach's
    /// own members).
    pub fn with_list_path(
        session: Arc<SessionGuard>,
        paths: ResourcePaths,
        list_path: impl Into<String>,
    ) -> Self {
        let scope = Scope::Role(session.role());
        let client = session.client().clone();
        let loader = ListLoader::new(client.clone(), scope, list_path);
        let controller =
            MutationController::new(client, scope, paths, loader.collection().clone());
        Self {
            session,
            loader,
            controller,
            gate: ConfirmationGate::new(),
        }
    }

    pub fn session(&self) -> &SessionGuard {
        &self.session
    }

    pub fn collection(&self) -> &Collection<T> {
        self.loader.collection()
    }

    pub fn loader(&self) -> &ListLoader<T> {
        &self.loader
    }

    pub fn controller(&self) -> &MutationController<T> {
        &self.controller
    }

    pub fn gate(&self) -> &ConfirmationGate {
        &self.gate
    }

    pub fn token(&self) -> Result<String, ApiError> {
        self.session.token()
    }

    /// A token the server refused is stale: drop this role's session so the
    /// next guard check redirects to login.
    fn expire_on_auth(&self, err: &ApiError) {
        if let ApiError::InvalidToken { .. } = err {
            info!(role = %self.session.role(), "Token refused, clearing session");
            if let Err(e) = self.session.logout() {
                warn!(error = %e, "Failed to clear session");
            }
        }
    }

    pub(crate) fn observe<R>(&self, result: Result<R, MutationError>) -> Result<R, MutationError> {
        if let Err(MutationError::Api(e)) = &result {
            self.expire_on_auth(e);
        }
        result
    }

    pub async fn load(&self, query: &ListQuery) -> Result<Vec<T>, ApiError> {
        let token = self.token()?;
        let result = self.loader.load(Some(&token), query).await;
        if let Err(e) = &result {
            self.expire_on_auth(e);
        }
        result
    }

    pub fn view(&self, criteria: &FilterCriteria) -> ListView<T> {
        self.loader.view(criteria)
    }

    pub fn find(&self, id: &EntityId) -> Result<T, MutationError> {
        self.collection()
            .get(id)
            .ok_or_else(|| MutationError::NotFound(id.clone()))
    }

    /// Run `action` behind the confirmation gate. Session expiry seen by the
    /// action clears the stored session.
    pub async fn confirmed<R, F, Fut>(
        &self,
        prompt: ConfirmPrompt,
        decider: &dyn Decider,
        action: F,
    ) -> Result<GateOutcome<R>, GateError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<R, MutationError>>,
    {
        let outcome = self.gate.run(prompt, decider, action).await?;
        if let GateOutcome::Failed(MutationError::Api(e)) = &outcome {
            self.expire_on_auth(e);
        }
        Ok(outcome)
    }

    pub async fn delete(
        &self,
        id: &EntityId,
        decider: &dyn Decider,
    ) -> Result<GateOutcome<T>, GateError> {
        let record = match self.find(id) {
            Ok(record) => record,
            Err(e) => return Ok(GateOutcome::Failed(e)),
        };
        let prompt = ConfirmPrompt::new(format!("Xóa {}", T::NOUN), record.label()).destructive();
        self.confirmed(prompt, decider, move || async move {
            let token = self.token()?;
            self.controller.delete(&token, id).await
        })
        .await
    }

    /// `POST /change-status-{slug}/:id { status }`, confirm-then-commit.
    pub(crate) async fn change_status<S>(
        &self,
        id: &EntityId,
        status: S,
        decider: &dyn Decider,
        apply: impl FnOnce(&mut T),
    ) -> Result<GateOutcome<T>, GateError>
    where
        S: Serialize + Display,
    {
        let record = match self.find(id) {
            Ok(record) => record,
            Err(e) => return Ok(GateOutcome::Failed(e)),
        };
        let prompt = ConfirmPrompt::new(
            format!("Chuyển {} sang \"{}\"", T::NOUN, status),
            record.label(),
        );
        self.confirmed(prompt, decider, move || async move {
            let token = self.token()?;
            let request = self
                .controller
                .post(&token, self.controller.paths().change_status(id))
                .json(&json!({ "status": status }))?;
            self.controller.commit(id, request, apply).await
        })
        .await
    }
}
