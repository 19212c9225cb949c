//! Admin dashboard figures, computed from loaded collections only.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{accounts, orders, packages, reviews};
use crate::api::ApiError;
use crate::loader::ListQuery;
use crate::models::{
    AccountHolder, AccountStatus, Coach, Member, Order, Package, PackageStatus, PaymentStatus,
    Review, ReviewStatus,
};
use crate::session::SessionGuard;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub active: usize,
    pub inactive: usize,
    pub banned: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.active + self.inactive + self.banned
    }

    fn tally<T: AccountHolder>(records: &[T]) -> Self {
        records
            .iter()
            .fold(Self::default(), |mut counts, r| {
                match r.account_status() {
                    AccountStatus::Active => counts.active += 1,
                    AccountStatus::Inactive => counts.inactive += 1,
                    AccountStatus::Banned => counts.banned += 1,
                }
                counts
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub members: StatusCounts,
    pub coaches: StatusCounts,
    pub active_packages: usize,
    pub inactive_packages: usize,
    /// Order count per wire status (`Pending`, `Completed`, ...)
    pub orders_by_status: BTreeMap<String, usize>,
    /// Sum of paid orders
    pub paid_revenue: f64,
    /// Paid revenue keyed by `YYYY-MM` of the order date
    pub revenue_by_month: BTreeMap<String, f64>,
    pub pending_reviews: usize,
    pub average_rating: Option<f64>,
}

impl DashboardSummary {
    pub fn compute(
        members: &[Member],
        coaches: &[Coach],
        packages: &[Package],
        orders: &[Order],
        reviews: &[Review],
    ) -> Self {
        let mut summary = Self {
            members: StatusCounts::tally(members),
            coaches: StatusCounts::tally(coaches),
            average_rating: reviews::average_rating(reviews),
            ..Self::default()
        };

        for package in packages {
            match package.status {
                PackageStatus::Active => summary.active_packages += 1,
                PackageStatus::Inactive => summary.inactive_packages += 1,
            }
        }

        for order in orders {
            *summary
                .orders_by_status
                .entry(order.status.to_string())
                .or_default() += 1;

            if order.payment_status == PaymentStatus::Paid {
                summary.paid_revenue += order.total_amount;
                if let Some(date) = order.order_date_parsed() {
                    *summary
                        .revenue_by_month
                        .entry(date.format("%Y-%m").to_string())
                        .or_default() += order.total_amount;
                }
            }
        }

        summary.pending_reviews = reviews
            .iter()
            .filter(|r| r.status == ReviewStatus::Pending)
            .count();
        summary
    }
}

/// Load every admin collection concurrently and summarise them.
pub async fn load_summary(session: Arc<SessionGuard>) -> Result<DashboardSummary, ApiError> {
    let members = accounts::members(session.clone());
    let coaches = accounts::coaches(session.clone());
    let packages = packages::packages(session.clone());
    let orders = orders::orders(session.clone());
    let reviews = reviews::reviews(session);

    let query = ListQuery::default();
    let (m, c, p, o, r) = tokio::join!(
        members.load(&query),
        coaches.load(&query),
        packages.load(&query),
        orders.load(&query),
        reviews.load(&query),
    );

    Ok(DashboardSummary::compute(&m?, &c?, &p?, &o?, &r?))
}
