//! Members and coaches: lock, unlock and ban.

use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::{Labelled, Resource};
use crate::api::endpoints::{self, COACHES, CUSTOMERS};
use crate::confirm::{ConfirmPrompt, Decider, GateError, GateOutcome};
use crate::loader::Filterable;
use crate::models::{AccountHolder, AccountStatus, Coach, Entity, EntityId, Member};
use crate::mutation::MutationError;
use crate::session::SessionGuard;

impl Labelled for Member {
    const NOUN: &'static str = "hội viên";

    fn label(&self) -> String {
        self.full_name.clone()
    }
}

impl Labelled for Coach {
    const NOUN: &'static str = "huấn luyện viên";

    fn label(&self) -> String {
        self.full_name.clone()
    }
}

/// Admin view of all members.
pub fn members(session: Arc<SessionGuard>) -> Resource<Member> {
    Resource::new(session, CUSTOMERS)
}

pub fn coaches(session: Arc<SessionGuard>) -> Resource<Coach> {
    Resource::new(session, COACHES)
}

/// Coach view of the members assigned to them.
pub fn assigned_members(session: Arc<SessionGuard>) -> Resource<Member> {
    Resource::with_list_path(session, CUSTOMERS, endpoints::MY_MEMBERS)
}

/// Modal headline for moving an account to `target`.
pub fn status_action(noun: &str, target: AccountStatus) -> String {
    let verb = match target {
        AccountStatus::Active => "Kích hoạt",
        AccountStatus::Inactive => "Khóa",
        AccountStatus::Banned => "Cấm",
    };
    format!("{} {}", verb, noun)
}

/// Transitions offered for an account in `current`. Nothing once banned.
pub fn available_transitions(current: AccountStatus) -> Vec<AccountStatus> {
    match current {
        AccountStatus::Active => vec![AccountStatus::Inactive, AccountStatus::Banned],
        AccountStatus::Inactive => vec![AccountStatus::Active, AccountStatus::Banned],
        AccountStatus::Banned => Vec::new(),
    }
}

impl<T> Resource<T>
where
    T: Entity + AccountHolder + DeserializeOwned + Filterable + Labelled,
{
    /// Confirm, then lock/unlock/ban. A banned account never gets a prompt.
    pub async fn change_account_status(
        &self,
        id: &EntityId,
        target: AccountStatus,
        decider: &dyn Decider,
    ) -> Result<GateOutcome<T>, GateError> {
        let record = match self.find(id) {
            Ok(record) => record,
            Err(e) => return Ok(GateOutcome::Failed(e)),
        };
        if record.account_status().is_terminal() {
            return Ok(GateOutcome::Failed(MutationError::Banned(id.clone())));
        }

        let mut prompt = ConfirmPrompt::new(status_action(T::NOUN, target), record.label());
        if target == AccountStatus::Banned {
            prompt = prompt.destructive();
        }
        self.confirmed(prompt, decider, move || async move {
            let token = self.token()?;
            self.controller()
                .change_account_status(&token, id, target)
                .await
        })
        .await
    }
}
