//! Initiator accessors
//!
//! The cluster reports access-group membership as a list, but an initiator
//! belongs to at most one group. Only a list of exactly one is flattened;
//! any other length leaves the membership unset.

use super::expect_one;
use crate::domain::ports::{Attributes, EntityId, EntityKind};
use crate::error::Result;
use crate::rpc::ElementClient;
use serde::{Deserialize, Serialize};
use tracing::debug;

// =============================================================================
// Wire Types
// =============================================================================

/// Initiator as reported by `ListInitiators`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitiatorRecord {
    #[serde(rename = "initiatorID")]
    initiator_id: EntityId,
    initiator_name: String,
    #[serde(default)]
    alias: String,
    #[serde(default)]
    attributes: Option<Attributes>,
    #[serde(default)]
    volume_access_groups: Vec<EntityId>,
}

/// Initiator with its membership flattened
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Initiator {
    pub initiator_id: EntityId,
    pub name: String,
    pub alias: String,
    pub attributes: Option<Attributes>,
    /// Set only when the cluster reports exactly one membership
    pub volume_access_group_id: Option<EntityId>,
}

impl From<InitiatorRecord> for Initiator {
    fn from(record: InitiatorRecord) -> Self {
        let volume_access_group_id = match record.volume_access_groups.as_slice() {
            [only] => Some(*only),
            [] => None,
            many => {
                debug!(
                    "Initiator {} reports {} access groups, leaving membership unset",
                    record.initiator_id,
                    many.len()
                );
                None
            }
        };

        Self {
            initiator_id: record.initiator_id,
            name: record.initiator_name,
            alias: record.alias,
            attributes: record.attributes,
            volume_access_group_id,
        }
    }
}

/// One initiator in a `CreateInitiators` call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInitiator {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    #[serde(rename = "volumeAccessGroupID", skip_serializing_if = "Option::is_none")]
    pub volume_access_group_id: Option<EntityId>,
}

/// One initiator in a `ModifyInitiators` call
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatorChanges {
    #[serde(rename = "initiatorID")]
    pub initiator_id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    #[serde(rename = "volumeAccessGroupID", skip_serializing_if = "Option::is_none")]
    pub volume_access_group_id: Option<EntityId>,
}

#[derive(Debug, Clone, Serialize)]
struct InitiatorsRequest<T> {
    initiators: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
struct InitiatorsResult {
    #[serde(default)]
    initiators: Vec<InitiatorRecord>,
}

// =============================================================================
// Accessors
// =============================================================================

impl ElementClient {
    /// Create a single initiator, returning its new ID
    pub async fn create_initiator(&self, initiator: NewInitiator) -> Result<EntityId> {
        let result: InitiatorsResult = self
            .call(
                "CreateInitiators",
                &InitiatorsRequest {
                    initiators: vec![initiator],
                },
            )
            .await?;
        let created = expect_one(EntityKind::Initiator, result.initiators)?;
        Ok(created.initiator_id)
    }

    /// Fetch one initiator via `ListInitiators` constrained to its ID
    pub async fn get_initiator_by_id(&self, id: EntityId) -> Result<Initiator> {
        let result: InitiatorsResult = self
            .call(
                "ListInitiators",
                &InitiatorsRequest {
                    initiators: vec![id],
                },
            )
            .await?;
        expect_one(EntityKind::Initiator, result.initiators).map(Initiator::from)
    }

    pub async fn modify_initiator(&self, changes: InitiatorChanges) -> Result<()> {
        self.call_api_method(
            "ModifyInitiators",
            Some(&InitiatorsRequest {
                initiators: vec![changes],
            }),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_initiator(&self, id: EntityId) -> Result<()> {
        self.call_api_method(
            "DeleteInitiators",
            Some(&InitiatorsRequest {
                initiators: vec![id],
            }),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::client::testing::{client, Reply, ScriptedTransport};
    use serde_json::json;

    fn listing(groups: serde_json::Value) -> Reply {
        Reply::Result(json!({"initiators": [{
            "initiatorID": 3,
            "initiatorName": "iqn.1993-08.org.debian:01:host-a",
            "alias": "host-a",
            "attributes": {},
            "volumeAccessGroups": groups
        }]}))
    }

    #[tokio::test]
    async fn test_single_membership_is_flattened() {
        let transport = ScriptedTransport::new(vec![listing(json!([12]))]);
        let initiator = client(transport.clone()).get_initiator_by_id(3).await.unwrap();

        assert_eq!(initiator.name, "iqn.1993-08.org.debian:01:host-a");
        assert_eq!(initiator.alias, "host-a");
        assert_eq!(initiator.volume_access_group_id, Some(12));
        assert_eq!(transport.params(0), json!({"initiators": [3]}));
    }

    #[tokio::test]
    async fn test_ambiguous_membership_left_unset() {
        let transport = ScriptedTransport::new(vec![listing(json!([])), listing(json!([12, 13]))]);
        let client = client(transport);

        let none = client.get_initiator_by_id(3).await.unwrap();
        assert_eq!(none.volume_access_group_id, None);

        let many = client.get_initiator_by_id(3).await.unwrap();
        assert_eq!(many.volume_access_group_id, None);
    }

    #[tokio::test]
    async fn test_create_initiator_wire_shape() {
        let transport = ScriptedTransport::new(vec![Reply::Result(json!({
            "initiators": [{"initiatorID": 21, "initiatorName": "iqn.host-b"}]
        }))]);
        let client = client(transport.clone());

        let id = client
            .create_initiator(NewInitiator {
                name: "iqn.host-b".into(),
                alias: None,
                attributes: None,
                volume_access_group_id: Some(4),
            })
            .await
            .unwrap();

        assert_eq!(id, 21);
        assert_eq!(
            transport.params(0),
            json!({"initiators": [{"name": "iqn.host-b", "volumeAccessGroupID": 4}]})
        );
    }

    #[tokio::test]
    async fn test_modify_initiator_omits_unset() {
        let transport = ScriptedTransport::new(vec![Reply::Result(json!({}))]);
        let client = client(transport.clone());

        client
            .modify_initiator(InitiatorChanges {
                initiator_id: 3,
                alias: Some("renamed".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(
            transport.params(0),
            json!({"initiators": [{"initiatorID": 3, "alias": "renamed"}]})
        );
    }
}
