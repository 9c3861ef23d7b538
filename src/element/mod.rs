//! Element Entity Accessors
//!
//! Typed request/response shaping for each entity kind. Parameter structs
//! omit unset optional fields from the wire entirely, and single-ID lookups
//! insist on exactly one matching record.
//!
//! - Account: `AddAccount`, `GetAccountByID`, `ModifyAccount`, `RemoveAccount`
//! - Volume: `CreateVolume`, `ListVolumes`, `ModifyVolume`, `DeleteVolume`,
//!   `PurgeDeletedVolume`
//! - Initiator: `CreateInitiators`, `ListInitiators`, `ModifyInitiators`,
//!   `DeleteInitiators`
//! - Access group: `CreateVolumeAccessGroup`, `ListVolumeAccessGroups`,
//!   `ModifyVolumeAccessGroup`, `DeleteVolumeAccessGroup`

pub mod access_group;
pub mod account;
pub mod initiator;
pub mod volume;

pub use access_group::*;
pub use account::*;
pub use initiator::*;
pub use volume::*;

use crate::domain::ports::EntityKind;
use crate::error::{Error, Result};

/// Take the only record of a single-ID lookup. Zero records means the
/// entity is gone; more than one is a protocol inconsistency.
pub(crate) fn expect_one<T>(kind: EntityKind, mut records: Vec<T>) -> Result<T> {
    match records.len() {
        1 => Ok(records.remove(0)),
        count => Err(Error::UnexpectedCount {
            kind: kind.to_string(),
            count,
        }),
    }
}
