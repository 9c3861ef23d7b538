//! Volume accessors
//!
//! Deleting a volume moves it to the cluster's trash; it is only gone once
//! `PurgeDeletedVolume` succeeds.

use super::expect_one;
use crate::domain::ports::{Attributes, EntityId, EntityKind};
use crate::error::Result;
use crate::rpc::ElementClient;
use serde::{Deserialize, Serialize};

// =============================================================================
// Wire Types
// =============================================================================

/// Quality-of-service settings; unset members are omitted on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityOfService {
    #[serde(rename = "minIOPS", default, skip_serializing_if = "Option::is_none")]
    pub min_iops: Option<i64>,
    #[serde(rename = "maxIOPS", default, skip_serializing_if = "Option::is_none")]
    pub max_iops: Option<i64>,
    #[serde(rename = "burstIOPS", default, skip_serializing_if = "Option::is_none")]
    pub burst_iops: Option<i64>,
}

impl QualityOfService {
    /// Whether any member is set
    pub fn is_set(&self) -> bool {
        self.min_iops.is_some() || self.max_iops.is_some() || self.burst_iops.is_some()
    }

    /// `Some(self)` when at least one member is set
    pub fn non_empty(self) -> Option<Self> {
        self.is_set().then_some(self)
    }
}

/// Volume as reported by the cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(rename = "volumeID")]
    pub volume_id: EntityId,
    pub name: String,
    #[serde(rename = "accountID", default)]
    pub account_id: EntityId,
    #[serde(default)]
    pub total_size: i64,
    #[serde(rename = "enable512e", default)]
    pub enable512e: bool,
    #[serde(default)]
    pub qos: QualityOfService,
    #[serde(default)]
    pub attributes: Option<Attributes>,
    /// iSCSI target name assigned at creation
    #[serde(default)]
    pub iqn: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVolumeRequest {
    pub name: String,
    #[serde(rename = "accountID")]
    pub account_id: EntityId,
    pub total_size: i64,
    #[serde(rename = "enable512e")]
    pub enable512e: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qos: Option<QualityOfService>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

/// Result of `CreateVolume`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVolumeResult {
    #[serde(rename = "volumeID")]
    pub volume_id: EntityId,
    #[serde(default)]
    pub volume: Option<Volume>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListVolumesRequest {
    #[serde(rename = "volumeIDs")]
    volume_ids: Vec<EntityId>,
}

#[derive(Debug, Clone, Deserialize)]
struct ListVolumesResult {
    #[serde(default)]
    volumes: Vec<Volume>,
}

/// Volume modification; unset fields are left untouched remotely
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyVolumeRequest {
    #[serde(rename = "volumeID")]
    pub volume_id: EntityId,
    #[serde(rename = "accountID", skip_serializing_if = "Option::is_none")]
    pub account_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qos: Option<QualityOfService>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

#[derive(Debug, Clone, Serialize)]
struct VolumeIdRequest {
    #[serde(rename = "volumeID")]
    volume_id: EntityId,
}

// =============================================================================
// Accessors
// =============================================================================

impl ElementClient {
    pub async fn create_volume(&self, request: &CreateVolumeRequest) -> Result<CreateVolumeResult> {
        self.call("CreateVolume", request).await
    }

    /// Fetch one volume via `ListVolumes` constrained to its ID
    pub async fn get_volume_by_id(&self, id: EntityId) -> Result<Volume> {
        let result: ListVolumesResult = self
            .call("ListVolumes", &ListVolumesRequest { volume_ids: vec![id] })
            .await?;
        expect_one(EntityKind::Volume, result.volumes)
    }

    pub async fn modify_volume(&self, request: &ModifyVolumeRequest) -> Result<()> {
        self.call_api_method("ModifyVolume", Some(request)).await?;
        Ok(())
    }

    /// Soft delete; the volume stays recoverable until purged
    pub async fn delete_volume(&self, id: EntityId) -> Result<()> {
        self.call_api_method("DeleteVolume", Some(&VolumeIdRequest { volume_id: id }))
            .await?;
        Ok(())
    }

    pub async fn purge_deleted_volume(&self, id: EntityId) -> Result<()> {
        self.call_api_method("PurgeDeletedVolume", Some(&VolumeIdRequest { volume_id: id }))
            .await?;
        Ok(())
    }
}
