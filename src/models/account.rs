//! Account status shared by members and coaches.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::WireStatus;

/// Tri-state account status, encoded on the wire as `1 / 0 / -1`.
///
/// `Banned` is terminal: once an account is banned no lock/unlock transition
/// is offered or attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountStatus {
    Active,
    Inactive,
    Banned,
}

impl WireStatus for AccountStatus {
    type Wire = i8;

    const TABLE: &'static [(Self, i8)] = &[
        (AccountStatus::Active, 1),
        (AccountStatus::Inactive, 0),
        (AccountStatus::Banned, -1),
    ];

    fn to_wire(self) -> i8 {
        match self {
            AccountStatus::Active => 1,
            AccountStatus::Inactive => 0,
            AccountStatus::Banned => -1,
        }
    }
}

impl AccountStatus {
    pub fn is_terminal(self) -> bool {
        self == AccountStatus::Banned
    }

    pub fn label(self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Banned => "banned",
        }
    }
}

/// Records carrying an [`AccountStatus`] (members and coaches).
pub trait AccountHolder {
    fn account_status(&self) -> AccountStatus;
    fn set_account_status(&mut self, status: AccountStatus);
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    /// Accepts either the wire number (`"1"`, `"0"`, `"-1"`) or the label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i8>() {
            return Self::from_wire(n).ok_or_else(|| format!("unknown account status: {}", s));
        }
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(AccountStatus::Active),
            "inactive" | "locked" => Ok(AccountStatus::Inactive),
            "banned" => Ok(AccountStatus::Banned),
            _ => Err(format!("unknown account status: {}", s)),
        }
    }
}

impl Serialize for AccountStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.to_wire())
    }
}

impl<'de> Deserialize<'de> for AccountStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i8::deserialize(deserializer)?;
        Self::from_wire(raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown account status: {}", raw)))
    }
}
