//! Volume access group reconciler

use super::{overlay, settle_exists};
use crate::domain::ports::{required, Attributes, EntityId, EntityKind, Resource, ResourceData};
use crate::element::{CreateAccessGroupRequest, ModifyAccessGroupRequest};
use crate::error::Result;
use crate::rpc::ElementClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Access group fields held by the driver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessGroupFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Member initiator names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiators: Option<Vec<String>>,
    /// Member volume IDs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<EntityId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

/// Reconciles Element volume access groups
#[derive(Debug, Clone)]
pub struct AccessGroupResource {
    client: ElementClient,
}

impl AccessGroupResource {
    pub fn new(client: ElementClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for AccessGroupResource {
    type Fields = AccessGroupFields;

    fn kind(&self) -> EntityKind {
        EntityKind::AccessGroup
    }

    async fn create(&self, data: &mut ResourceData<AccessGroupFields>) -> Result<()> {
        let name = required(&data.fields.name, "name")?.clone();

        let id = self
            .client
            .create_access_group(&CreateAccessGroupRequest {
                name: name.clone(),
                initiators: data.fields.initiators.clone(),
                volumes: data.fields.volumes.clone(),
                attributes: data.fields.attributes.clone(),
            })
            .await?;

        data.set_id(id);
        info!("Created volume access group: {} {}", name, id);

        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData<AccessGroupFields>) -> Result<()> {
        let id = data.entity_id()?;
        let group = self.client.get_access_group_by_id(id).await?;
        debug!(
            "Read volume access group {}: {} ({} initiators, {} volumes)",
            id,
            group.name,
            group.initiators.len(),
            group.volumes.len()
        );

        let fields = &mut data.fields;
        fields.name = Some(group.name);
        fields.initiators = Some(group.initiators);
        fields.volumes = Some(group.volumes);
        fields.attributes = group.attributes;
        Ok(())
    }

    async fn update(
        &self,
        data: &mut ResourceData<AccessGroupFields>,
        changes: &AccessGroupFields,
    ) -> Result<()> {
        let id = data.entity_id()?;

        self.client
            .modify_access_group(&ModifyAccessGroupRequest {
                volume_access_group_id: id,
                name: changes.name.clone(),
                initiators: changes.initiators.clone(),
                volumes: changes.volumes.clone(),
                attributes: changes.attributes.clone(),
            })
            .await?;

        let fields = &mut data.fields;
        overlay(&mut fields.name, &changes.name);
        overlay(&mut fields.initiators, &changes.initiators);
        overlay(&mut fields.volumes, &changes.volumes);
        overlay(&mut fields.attributes, &changes.attributes);
        info!("Updated volume access group {}", id);
        Ok(())
    }

    async fn delete(&self, data: &mut ResourceData<AccessGroupFields>) -> Result<()> {
        let id = data.entity_id()?;
        self.client.delete_access_group(id).await?;
        data.clear_id();
        info!("Deleted volume access group {}", id);
        Ok(())
    }

    async fn exists(&self, data: &mut ResourceData<AccessGroupFields>) -> Result<bool> {
        let id = data.entity_id()?;
        let outcome = self.client.get_access_group_by_id(id).await;
        settle_exists(data, self.kind(), outcome)
    }
}
