//! Volume reconciler

use super::{immutable, overlay, settle_exists};
use crate::domain::ports::{required, Attributes, EntityId, EntityKind, Resource, ResourceData};
use crate::element::{CreateVolumeRequest, ModifyVolumeRequest, QualityOfService};
use crate::error::Result;
use crate::rpc::ElementClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Volume fields held by the driver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<EntityId>,
    /// Bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable512e: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_iops: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iops: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst_iops: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    /// Assigned by the cluster at creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iqn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl VolumeFields {
    fn qos(&self) -> Option<QualityOfService> {
        QualityOfService {
            min_iops: self.min_iops,
            max_iops: self.max_iops,
            burst_iops: self.burst_iops,
        }
        .non_empty()
    }
}

/// Reconciles Element volumes
#[derive(Debug, Clone)]
pub struct VolumeResource {
    client: ElementClient,
}

impl VolumeResource {
    pub fn new(client: ElementClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for VolumeResource {
    type Fields = VolumeFields;

    fn kind(&self) -> EntityKind {
        EntityKind::Volume
    }

    async fn create(&self, data: &mut ResourceData<VolumeFields>) -> Result<()> {
        let fields = &data.fields;
        let request = CreateVolumeRequest {
            name: required(&fields.name, "name")?.clone(),
            account_id: *required(&fields.account_id, "account_id")?,
            total_size: *required(&fields.total_size, "total_size")?,
            enable512e: *required(&fields.enable512e, "enable512e")?,
            qos: fields.qos(),
            attributes: fields.attributes.clone(),
        };

        let created = self.client.create_volume(&request).await?;

        data.set_id(created.volume_id);
        if let Some(volume) = created.volume.filter(|v| !v.iqn.is_empty()) {
            data.fields.iqn = Some(volume.iqn);
        }
        info!("Created volume: {} {}", request.name, created.volume_id);

        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData<VolumeFields>) -> Result<()> {
        let id = data.entity_id()?;
        let volume = self.client.get_volume_by_id(id).await?;
        debug!("Read volume {}: {} ({})", id, volume.name, volume.status);

        let fields = &mut data.fields;
        fields.name = Some(volume.name);
        fields.account_id = Some(volume.account_id);
        fields.total_size = Some(volume.total_size);
        fields.enable512e = Some(volume.enable512e);
        fields.min_iops = volume.qos.min_iops;
        fields.max_iops = volume.qos.max_iops;
        fields.burst_iops = volume.qos.burst_iops;
        fields.attributes = volume.attributes;
        fields.iqn = Some(volume.iqn).filter(|iqn| !iqn.is_empty());
        fields.status = Some(volume.status);
        Ok(())
    }

    async fn update(
        &self,
        data: &mut ResourceData<VolumeFields>,
        changes: &VolumeFields,
    ) -> Result<()> {
        let id = data.entity_id()?;
        immutable(&changes.name, "name")?;
        immutable(&changes.enable512e, "enable512e")?;
        immutable(&changes.iqn, "iqn")?;

        self.client
            .modify_volume(&ModifyVolumeRequest {
                volume_id: id,
                account_id: changes.account_id,
                total_size: changes.total_size,
                qos: changes.qos(),
                attributes: changes.attributes.clone(),
            })
            .await?;

        let fields = &mut data.fields;
        overlay(&mut fields.account_id, &changes.account_id);
        overlay(&mut fields.total_size, &changes.total_size);
        overlay(&mut fields.min_iops, &changes.min_iops);
        overlay(&mut fields.max_iops, &changes.max_iops);
        overlay(&mut fields.burst_iops, &changes.burst_iops);
        overlay(&mut fields.attributes, &changes.attributes);
        info!("Updated volume {}", id);
        Ok(())
    }

    async fn delete(&self, data: &mut ResourceData<VolumeFields>) -> Result<()> {
        let id = data.entity_id()?;
        self.client.delete_volume(id).await?;

        if let Err(e) = self.client.purge_deleted_volume(id).await {
            warn!("Volume {} deleted but purge failed: {}", id, e);
            return Err(e);
        }

        data.clear_id();
        info!("Deleted and purged volume {}", id);
        Ok(())
    }

    async fn exists(&self, data: &mut ResourceData<VolumeFields>) -> Result<bool> {
        let id = data.entity_id()?;
        let outcome = self.client.get_volume_by_id(id).await;
        settle_exists(data, self.kind(), outcome)
    }
}
