//! Entity models as the REST backend sends them.
//!
//! This module is organized into submodules by entity:
//! - `common`: Ids, references, pagination and the wire-status table trait
//! - `account`: Tri-state account status for members and coaches
//! - `member`: Members (customers) and coaches
//! - `package`: Membership packages
//! - `order`: Orders and payment state
//! - `review`: Package reviews
//! - `room`: Rooms and facilities
//! - `profile`: Signed-in user profile and login payloads

mod account;
pub(crate) mod common;
mod member;
mod order;
mod package;
mod profile;
mod review;
mod room;

pub use account::*;
pub use common::{Entity, EntityId, Linked, Pagination, RecordRef, WireStatus};
pub use member::*;
pub use order::*;
pub use package::*;
pub use profile::*;
pub use review::*;
pub use room::*;
