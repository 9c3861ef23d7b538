//! Resource Reconcilers
//!
//! One [`Resource`](crate::domain::ports::Resource) implementation per
//! entity kind, all sharing a single [`ElementClient`].
//!
//! Only `exists` recovers from an error: a not-found class failure turns
//! into "absent" and clears the cached ID. Everything else propagates to the
//! driver untouched; nothing here retries.

pub mod access_group;
pub mod account;
pub mod initiator;
pub mod volume;

pub use access_group::{AccessGroupFields, AccessGroupResource};
pub use account::{AccountFields, AccountResource};
pub use initiator::{InitiatorFields, InitiatorResource};
pub use volume::{VolumeFields, VolumeResource};

use crate::domain::ports::{EntityKind, ResourceData};
use crate::error::{Error, Result};
use crate::rpc::ElementClient;
use tracing::info;

/// All reconcilers over one shared client
#[derive(Debug, Clone)]
pub struct Reconcilers {
    pub accounts: AccountResource,
    pub volumes: VolumeResource,
    pub initiators: InitiatorResource,
    pub access_groups: AccessGroupResource,
}

impl Reconcilers {
    pub fn new(client: ElementClient) -> Self {
        Self {
            accounts: AccountResource::new(client.clone()),
            volumes: VolumeResource::new(client.clone()),
            initiators: InitiatorResource::new(client.clone()),
            access_groups: AccessGroupResource::new(client),
        }
    }
}

/// Turn the outcome of an existence probe into the `exists` answer
pub(crate) fn settle_exists<F, T>(
    data: &mut ResourceData<F>,
    kind: EntityKind,
    outcome: Result<T>,
) -> Result<bool> {
    match outcome {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => {
            info!(
                "{} {} no longer exists ({}), clearing ID",
                kind,
                data.id().unwrap_or_default(),
                e
            );
            data.clear_id();
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Overwrite `target` with `change` when the change is set
pub(crate) fn overlay<T: Clone>(target: &mut Option<T>, change: &Option<T>) {
    if let Some(value) = change {
        *target = Some(value.clone());
    }
}

/// Reject changes to a field the cluster fixes at creation
pub(crate) fn immutable<T>(change: &Option<T>, field: &str) -> Result<()> {
    match change {
        Some(_) => Err(Error::Validation(format!(
            "{} cannot be changed after creation",
            field
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn test_settle_exists() {
        let mut data = ResourceData::with_id("7", ());
        assert!(settle_exists(&mut data, EntityKind::Account, Ok(())).unwrap());
        assert_eq!(data.id(), Some("7"));

        let gone: Result<()> = Err(Error::rpc(
            "GetAccountByID",
            Error::Api(ApiError {
                code: 500,
                message: "unknown".into(),
                name: "xUnknownAccount".into(),
            }),
        ));
        assert!(!settle_exists(&mut data, EntityKind::Account, gone).unwrap());
        assert_eq!(data.id(), None);

        let mut data = ResourceData::with_id("7", ());
        let broken: Result<()> = Err(Error::Unauthenticated);
        assert!(settle_exists(&mut data, EntityKind::Account, broken).is_err());
        assert_eq!(data.id(), Some("7"));
    }

    #[test]
    fn test_overlay_and_immutable() {
        let mut target = Some(1);
        overlay(&mut target, &None);
        assert_eq!(target, Some(1));
        overlay(&mut target, &Some(2));
        assert_eq!(target, Some(2));

        assert!(immutable::<bool>(&None, "enable512e").is_ok());
        assert!(immutable(&Some(true), "enable512e").is_err());
    }
}
