//! Endpoint paths, relative to a role scope.
//!
//! The backend names every action endpoint `/{verb}-{slug}/:id`, always POST.
//! Deletion included.

use crate::models::EntityId;

pub const LOGIN: &str = "/login";
pub const CHECK_LOGIN: &str = "/check-login";
pub const PUBLIC_PACKAGES: &str = "/packages";

/// Path builder for one backend resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePaths {
    /// Singular slug used in action endpoints (`ban-customer`)
    pub slug: &'static str,
    /// Plural slug used in the list endpoint (`get-all-customers`)
    pub plural: &'static str,
}

pub const CUSTOMERS: ResourcePaths = ResourcePaths {
    slug: "customer",
    plural: "customers",
};
pub const COACHES: ResourcePaths = ResourcePaths {
    slug: "coach",
    plural: "coaches",
};
pub const PACKAGES: ResourcePaths = ResourcePaths {
    slug: "package",
    plural: "packages",
};
pub const ORDERS: ResourcePaths = ResourcePaths {
    slug: "order",
    plural: "orders",
};
pub const REVIEWS: ResourcePaths = ResourcePaths {
    slug: "review",
    plural: "reviews",
};
pub const ROOMS: ResourcePaths = ResourcePaths {
    slug: "room",
    plural: "rooms",
};
pub const FACILITIES: ResourcePaths = ResourcePaths {
    slug: "facility",
    plural: "facilities",
};

/// Coach-scoped: members assigned to the signed-in coach.
pub const MY_MEMBERS: &str = "/get-my-members";
/// Client-scoped: orders placed by the signed-in client.
pub const MY_ORDERS: &str = "/get-my-orders";
/// Client-scoped: submit a package review.
pub const CREATE_REVIEW: &str = "/create-review";

impl ResourcePaths {
    pub fn list(&self) -> String {
        format!("/get-all-{}", self.plural)
    }

    pub fn create(&self) -> String {
        format!("/create-{}", self.slug)
    }

    pub fn update(&self, id: &EntityId) -> String {
        self.action("update", id)
    }

    pub fn delete(&self, id: &EntityId) -> String {
        self.action("delete", id)
    }

    /// No-body ban endpoint
    pub fn ban(&self, id: &EntityId) -> String {
        self.action("ban", id)
    }

    /// Lock/unlock endpoint, body `{ newStatus }`
    pub fn lock_open(&self, id: &EntityId) -> String {
        self.action("lock-open", id)
    }

    pub fn change_status(&self, id: &EntityId) -> String {
        self.action("change-status", id)
    }

    pub fn action(&self, verb: &str, id: &EntityId) -> String {
        format!("/{}-{}/{}", verb, self.slug, id)
    }
}
