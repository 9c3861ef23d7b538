//! Volume access group accessors

use super::expect_one;
use crate::domain::ports::{Attributes, EntityId, EntityKind};
use crate::error::{Error, Result};
use crate::rpc::ElementClient;
use serde::{Deserialize, Serialize};

// =============================================================================
// Wire Types
// =============================================================================

/// Volume access group as reported by the cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeAccessGroup {
    #[serde(rename = "volumeAccessGroupID")]
    pub volume_access_group_id: EntityId,
    pub name: String,
    /// Member initiator names
    #[serde(default)]
    pub initiators: Vec<String>,
    /// Member volume IDs
    #[serde(default)]
    pub volumes: Vec<EntityId>,
    #[serde(default)]
    pub attributes: Option<Attributes>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccessGroupRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiators: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<EntityId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateAccessGroupResult {
    #[serde(rename = "volumeAccessGroupID", default)]
    volume_access_group_id: Option<EntityId>,
    #[serde(rename = "volumeAccessGroup", default)]
    volume_access_group: Option<VolumeAccessGroup>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListAccessGroupsRequest {
    volume_access_groups: Vec<EntityId>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListAccessGroupsResult {
    #[serde(default)]
    volume_access_groups: Vec<VolumeAccessGroup>,
    #[serde(default)]
    volume_access_groups_not_found: Vec<EntityId>,
}

/// Access group modification; unset fields are left untouched remotely
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyAccessGroupRequest {
    #[serde(rename = "volumeAccessGroupID")]
    pub volume_access_group_id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiators: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<EntityId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteAccessGroupRequest {
    #[serde(rename = "volumeAccessGroupID")]
    volume_access_group_id: EntityId,
    delete_orphan_initiators: bool,
    force: bool,
}

// =============================================================================
// Accessors
// =============================================================================

impl ElementClient {
    /// Create an access group, returning its new ID
    pub async fn create_access_group(&self, request: &CreateAccessGroupRequest) -> Result<EntityId> {
        let result: CreateAccessGroupResult =
            self.call("CreateVolumeAccessGroup", request).await?;

        result
            .volume_access_group_id
            .or(result.volume_access_group.map(|g| g.volume_access_group_id))
            .ok_or_else(|| Error::MissingId {
                method: "CreateVolumeAccessGroup".into(),
                kind: EntityKind::AccessGroup.to_string(),
            })
    }

    /// Fetch one access group via `ListVolumeAccessGroups` constrained to
    /// its ID. IDs the cluster lists as not found are reported as such.
    pub async fn get_access_group_by_id(&self, id: EntityId) -> Result<VolumeAccessGroup> {
        let result: ListAccessGroupsResult = self
            .call(
                "ListVolumeAccessGroups",
                &ListAccessGroupsRequest {
                    volume_access_groups: vec![id],
                },
            )
            .await?;

        if !result.volume_access_groups_not_found.is_empty() {
            return Err(Error::GroupsNotFound(result.volume_access_groups_not_found));
        }

        expect_one(EntityKind::AccessGroup, result.volume_access_groups)
    }

    pub async fn modify_access_group(&self, request: &ModifyAccessGroupRequest) -> Result<()> {
        self.call_api_method("ModifyVolumeAccessGroup", Some(request))
            .await?;
        Ok(())
    }

    /// Delete an access group, keeping its initiators
    pub async fn delete_access_group(&self, id: EntityId) -> Result<()> {
        self.call_api_method(
            "DeleteVolumeAccessGroup",
            Some(&DeleteAccessGroupRequest {
                volume_access_group_id: id,
                delete_orphan_initiators: false,
                force: false,
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
    use assert_matches::assert_matches;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_access_group_by_id() {
        let transport = ScriptedTransport::new(vec![Reply::Result(json!({
            "volumeAccessGroups": [{
                "volumeAccessGroupID": 4,
                "name": "esx-cluster",
                "initiators": ["iqn.host-a", "iqn.host-b"],
                "volumes": [9, 10],
                "attributes": {}
            }],
            "volumeAccessGroupsNotFound": []
        }))]);
        let client = client(transport.clone());

        let group = client.get_access_group_by_id(4).await.unwrap();
        assert_eq!(group.name, "esx-cluster");
        assert_eq!(group.initiators.len(), 2);
        assert_eq!(group.volumes, vec![9, 10]);
        assert_eq!(transport.params(0), json!({"volumeAccessGroups": [4]}));
    }

    #[tokio::test]
    async fn test_not_found_list_is_reported() {
        let transport = ScriptedTransport::new(vec![Reply::Result(json!({
            "volumeAccessGroups": [],
            "volumeAccessGroupsNotFound": [4]
        }))]);
        let err = client(transport).get_access_group_by_id(4).await.unwrap_err();

        assert!(err.is_not_found());
        assert_matches!(err, Error::GroupsNotFound(ids) if ids == vec![4]);
    }

    #[tokio::test]
    async fn test_create_access_group_wire_shape() {
        let transport = ScriptedTransport::new(vec![Reply::Result(json!({
            "volumeAccessGroupID": 4
        }))]);
        let client = client(transport.clone());

        let id = client
            .create_access_group(&CreateAccessGroupRequest {
                name: "esx-cluster".into(),
                initiators: None,
                volumes: Some(vec![9]),
                attributes: None,
            })
            .await
            .unwrap();

        assert_eq!(id, 4);
        assert_eq!(
            transport.params(0),
            json!({"name": "esx-cluster", "volumes": [9]})
        );
    }

    #[tokio::test]
    async fn test_delete_keeps_orphan_initiators() {
        let transport = ScriptedTransport::new(vec![Reply::Result(json!({}))]);
        let client = client(transport.clone());

        client.delete_access_group(4).await.unwrap();
        assert_eq!(
            transport.params(0),
            json!({"volumeAccessGroupID": 4, "deleteOrphanInitiators": false, "force": false})
        );
    }
}
