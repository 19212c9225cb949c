//! Common types shared across models.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Opaque server identifier. Backends send it either as a string (`"65f…"`)
/// or as a number (`42`); both are kept as their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl<'de> Visitor<'de> for IdVisitor {
            type Value = EntityId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string or integer id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<EntityId, E> {
                Ok(EntityId(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<EntityId, E> {
                Ok(EntityId(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<EntityId, E> {
                Ok(EntityId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<EntityId, E> {
                Ok(EntityId(v.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// Anything cached in a list view. Patching is always by `id` equality.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> &EntityId;
}

/// A status enumeration with a fixed wire table.
///
/// Encodings differ per entity (numbers for accounts, capitalised strings for
/// packages, lowercase strings for reviews and rooms); each implementor lists
/// its own table instead of sharing one.
pub trait WireStatus: Copy + PartialEq + Sized + 'static {
    type Wire: PartialEq + Copy + fmt::Debug + 'static;

    const TABLE: &'static [(Self, Self::Wire)];

    fn to_wire(self) -> Self::Wire;

    fn from_wire(wire: Self::Wire) -> Option<Self> {
        Self::TABLE.iter().find(|(_, w)| *w == wire).map(|(s, _)| *s)
    }
}

/// Implements serde for a string-encoded [`WireStatus`] through its table.
macro_rules! string_wire_serde {
    ($ty:ty, $what:literal) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(<$ty as $crate::models::WireStatus>::to_wire(*self))
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let raw = <String as serde::Deserialize>::deserialize(d)?;
                <$ty as $crate::models::WireStatus>::TABLE
                    .iter()
                    .find(|(_, w)| *w == raw.as_str())
                    .map(|(v, _)| *v)
                    .ok_or_else(|| {
                        serde::de::Error::custom(format!("unknown {}: {}", $what, raw))
                    })
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(<$ty as $crate::models::WireStatus>::to_wire(*self))
            }
        }

        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty as $crate::models::WireStatus>::TABLE
                    .iter()
                    .find(|(_, w)| w.eq_ignore_ascii_case(s))
                    .map(|(v, _)| *v)
                    .ok_or_else(|| format!("unknown {}: {}", $what, s))
            }
        }
    };
}

pub(crate) use string_wire_serde;

/// A reference that the backend may send populated or as a bare id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Linked<T> {
    Populated(T),
    Id(EntityId),
}

impl<T> Linked<T> {
    pub fn populated(&self) -> Option<&T> {
        match self {
            Linked::Populated(t) => Some(t),
            Linked::Id(_) => None,
        }
    }
}

/// Minimal view of a related record (client, package, room) embedded in another entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRef {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default, alias = "fullName")]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Pagination metadata, stored exactly as the server returned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_results: u64,
}
