use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three independent sign-in namespaces. Each role has its own storage
/// keys, API prefix and login route; nothing is shared or cross-read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Coach,
    Client,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Coach, Role::Client];

    /// Suffix of the storage keys (`tokenAdmin`, `dataAdmin`)
    pub fn namespace(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Coach => "Coach",
            Role::Client => "Client",
        }
    }

    pub fn token_key(&self) -> String {
        format!("token{}", self.namespace())
    }

    pub fn data_key(&self) -> String {
        format!("data{}", self.namespace())
    }

    pub fn api_prefix(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Coach => "/coach",
            Role::Client => "/client",
        }
    }

    /// Where an unauthenticated visitor of this role is sent.
    pub fn login_route(&self) -> &'static str {
        match self {
            Role::Admin => "/admin/login",
            Role::Coach => "/coach/login",
            Role::Client => "/login",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "coach" => Ok(Role::Coach),
            "client" => Ok(Role::Client),
            _ => Err(format!("unknown role: {} (expected admin, coach or client)", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_keys_are_namespaced() {
        assert_eq!(Role::Admin.token_key(), "tokenAdmin");
        assert_eq!(Role::Coach.data_key(), "dataCoach");
        assert_eq!(Role::Client.token_key(), "tokenClient");

        let mut keys: Vec<String> = Role::ALL
            .iter()
            .flat_map(|r| [r.token_key(), r.data_key()])
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 6);
    }

    #[test]
    fn test_parse_role() {
        assert_eq!("Coach".parse::<Role>().unwrap(), Role::Coach);
        assert!("owner".parse::<Role>().is_err());
    }
}
