//! Domain Ports - Core trait definitions for the reconciler
//!
//! The external orchestration framework owns a [`ResourceData`] record per
//! declared resource and drives a [`Resource`] implementation through
//! create / read / update / delete / exists.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identifier assigned by the cluster
pub type EntityId = i64;

/// Free-form attribute bag, passed through uninterpreted
pub type Attributes = serde_json::Value;

// =============================================================================
// Entity Kinds
// =============================================================================

/// Kinds of cluster entities managed by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Account,
    Volume,
    Initiator,
    AccessGroup,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Account => write!(f, "Account"),
            EntityKind::Volume => write!(f, "Volume"),
            EntityKind::Initiator => write!(f, "Initiator"),
            EntityKind::AccessGroup => write!(f, "Volume Access Group"),
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "account" => Ok(EntityKind::Account),
            "volume" => Ok(EntityKind::Volume),
            "initiator" => Ok(EntityKind::Initiator),
            "access_group" | "volume_access_group" | "vag" => Ok(EntityKind::AccessGroup),
            other => Err(Error::Validation(format!("unknown entity kind: {}", other))),
        }
    }
}

// =============================================================================
// Resource Data
// =============================================================================

/// The caller's local record of one resource: a cached identity plus the
/// entity's fields. The ID is a string because that is how the driving
/// framework stores it; it is only ever set from a cluster response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData<F> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(flatten)]
    pub fields: F,
}

impl<F> ResourceData<F> {
    /// New record without an identity
    pub fn new(fields: F) -> Self {
        Self { id: None, fields }
    }

    /// Record for an entity that already exists remotely
    pub fn with_id(id: impl Into<String>, fields: F) -> Self {
        Self {
            id: Some(id.into()),
            fields,
        }
    }

    /// Cached identity, if any
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Record the identity the cluster assigned
    pub fn set_id(&mut self, id: EntityId) {
        self.id = Some(id.to_string());
    }

    /// Forget the identity, marking the resource absent
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// Cached identity as a cluster ID; missing or non-numeric IDs are
    /// rejected before any remote call
    pub fn entity_id(&self) -> Result<EntityId> {
        let id = self
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::Validation("id argument is required".into()))?;

        id.parse()
            .map_err(|_| Error::Validation(format!("id must be numeric, got {:?}", id)))
    }
}

/// Require a field the caller must set
pub fn required<'a, T>(value: &'a Option<T>, field: &str) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| Error::Validation(format!("{} argument is required", field)))
}

// =============================================================================
// Resource Port
// =============================================================================

/// Reconciliation lifecycle for one entity kind
#[async_trait]
pub trait Resource: Send + Sync {
    /// Typed field set for this kind
    type Fields: Send + Sync;

    /// Entity kind handled
    fn kind(&self) -> EntityKind;

    /// Validate, create remotely, record the new ID, then read back.
    /// Not idempotent.
    async fn create(&self, data: &mut ResourceData<Self::Fields>) -> Result<()>;

    /// Refresh fields from the cluster. Errors, including not-found,
    /// propagate.
    async fn read(&self, data: &mut ResourceData<Self::Fields>) -> Result<()>;

    /// Send only the fields set in `changes`, then merge them locally
    async fn update(
        &self,
        data: &mut ResourceData<Self::Fields>,
        changes: &Self::Fields,
    ) -> Result<()>;

    /// Remove the entity and clear the cached ID
    async fn delete(&self, data: &mut ResourceData<Self::Fields>) -> Result<()>;

    /// Whether the entity still exists. Not-found clears the cached ID and
    /// yields `Ok(false)`; other errors propagate.
    async fn exists(&self, data: &mut ResourceData<Self::Fields>) -> Result<bool>;
}

pub type ResourceRef<F> = Arc<dyn Resource<Fields = F>>;

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_entity_kind_parse_and_display() {
        assert_eq!("volume".parse::<EntityKind>().unwrap(), EntityKind::Volume);
        assert_eq!("access-group".parse::<EntityKind>().unwrap(), EntityKind::AccessGroup);
        assert!("lun".parse::<EntityKind>().is_err());
        assert_eq!(format!("{}", EntityKind::AccessGroup), "Volume Access Group");
    }

    #[test]
    fn test_entity_id_validation() {
        let data: ResourceData<()> = ResourceData::new(());
        assert_matches!(data.entity_id(), Err(Error::Validation(_)));

        let data = ResourceData::with_id("abc", ());
        assert_matches!(data.entity_id(), Err(Error::Validation(_)));

        let mut data = ResourceData::with_id("42", ());
        assert_eq!(data.entity_id().unwrap(), 42);

        data.clear_id();
        assert_eq!(data.id(), None);
        data.set_id(7);
        assert_eq!(data.id(), Some("7"));
    }

    #[test]
    fn test_required_field() {
        let name: Option<String> = None;
        let err = required(&name, "name").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: name argument is required");
    }
}
