//! Review moderation (admin) and review submission (client).

use std::sync::Arc;
use tracing::{info, warn};

use super::{Labelled, Resource};
use crate::api::endpoints::{self, REVIEWS};
use crate::api::{validation, ApiError, ApiRequest, Scope};
use crate::confirm::{ConfirmPrompt, Decider, GateError, GateOutcome};
use crate::models::{EntityId, Linked, Review, ReviewDraft, ReviewStatus};
use crate::mutation::MutationError;
use crate::session::{Role, SessionGuard};

impl Labelled for Review {
    const NOUN: &'static str = "đánh giá";

    fn label(&self) -> String {
        let author = self
            .client
            .as_ref()
            .and_then(Linked::populated)
            .and_then(|c| c.name.clone())
            .unwrap_or_else(|| format!("#{}", self.id));
        format!("{} ({}★)", author, self.rating)
    }
}

pub fn reviews(session: Arc<SessionGuard>) -> Resource<Review> {
    Resource::new(session, REVIEWS)
}

impl Resource<Review> {
    pub async fn approve(
        &self,
        id: &EntityId,
        decider: &dyn Decider,
    ) -> Result<GateOutcome<Review>, GateError> {
        self.moderate(id, "approve", "Duyệt", ReviewStatus::Approved, decider)
            .await
    }

    pub async fn reject(
        &self,
        id: &EntityId,
        decider: &dyn Decider,
    ) -> Result<GateOutcome<Review>, GateError> {
        self.moderate(id, "reject", "Từ chối", ReviewStatus::Rejected, decider)
            .await
    }

    async fn moderate(
        &self,
        id: &EntityId,
        verb: &'static str,
        headline: &str,
        target: ReviewStatus,
        decider: &dyn Decider,
    ) -> Result<GateOutcome<Review>, GateError> {
        let review = match self.find(id) {
            Ok(review) => review,
            Err(e) => return Ok(GateOutcome::Failed(e)),
        };
        let mut prompt = ConfirmPrompt::new(format!("{} {}", headline, Review::NOUN), review.label());
        if target == ReviewStatus::Rejected {
            prompt = prompt.destructive();
        }
        self.confirmed(prompt, decider, move || async move {
            let token = self.token()?;
            let request = self.controller().post(&token, REVIEWS.action(verb, id));
            self.controller()
                .commit(id, request, |review| review.status = target)
                .await
        })
        .await
    }
}

/// Average rating of approved reviews, if any.
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    let approved: Vec<u8> = reviews
        .iter()
        .filter(|r| r.status == ReviewStatus::Approved)
        .map(|r| r.rating)
        .collect();
    if approved.is_empty() {
        return None;
    }
    Some(approved.iter().map(|&r| f64::from(r)).sum::<f64>() / approved.len() as f64)
}

/// `POST /client/create-review`. Validated first; the server decides the
/// initial moderation status.
pub async fn submit_review(
    session: &SessionGuard,
    draft: &ReviewDraft,
) -> Result<Option<Review>, MutationError> {
    validation::validate_review_draft(draft)?;
    let token = session.token()?;
    let request = ApiRequest::post(Scope::Role(Role::Client), endpoints::CREATE_REVIEW)
        .bearer(token)
        .json(draft)?;

    match session.client().send::<Review>(request).await {
        Ok(response) => {
            info!(package = %draft.package_id, rating = draft.rating, "Review submitted");
            Ok(response.data)
        }
        Err(e) => {
            if let ApiError::InvalidToken { .. } = e {
                if let Err(storage) = session.logout() {
                    warn!(error = %storage, "Failed to clear session");
                }
            }
            Err(e.into())
        }
    }
}
