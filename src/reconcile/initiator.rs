//! Initiator reconciler

use super::{immutable, overlay, settle_exists};
use crate::domain::ports::{required, Attributes, EntityId, EntityKind, Resource, ResourceData};
use crate::element::{InitiatorChanges, NewInitiator};
use crate::error::Result;
use crate::rpc::ElementClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Initiator fields held by the driver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitiatorFields {
    /// IQN or WWPN; fixed once created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_access_group_id: Option<EntityId>,
}

/// Reconciles Element initiators
#[derive(Debug, Clone)]
pub struct InitiatorResource {
    client: ElementClient,
}

impl InitiatorResource {
    pub fn new(client: ElementClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for InitiatorResource {
    type Fields = InitiatorFields;

    fn kind(&self) -> EntityKind {
        EntityKind::Initiator
    }

    async fn create(&self, data: &mut ResourceData<InitiatorFields>) -> Result<()> {
        let name = required(&data.fields.name, "name")?.clone();

        let id = self
            .client
            .create_initiator(NewInitiator {
                name: name.clone(),
                alias: data.fields.alias.clone(),
                attributes: data.fields.attributes.clone(),
                volume_access_group_id: data.fields.volume_access_group_id,
            })
            .await?;

        data.set_id(id);
        info!("Created initiator: {} {}", name, id);

        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData<InitiatorFields>) -> Result<()> {
        let id = data.entity_id()?;
        let initiator = self.client.get_initiator_by_id(id).await?;
        debug!("Read initiator {}: {}", id, initiator.name);

        let fields = &mut data.fields;
        fields.name = Some(initiator.name);
        fields.alias = Some(initiator.alias).filter(|alias| !alias.is_empty());
        fields.attributes = initiator.attributes;
        // Unset when the cluster reports no single membership; keep ours
        overlay(&mut fields.volume_access_group_id, &initiator.volume_access_group_id);
        Ok(())
    }

    async fn update(
        &self,
        data: &mut ResourceData<InitiatorFields>,
        changes: &InitiatorFields,
    ) -> Result<()> {
        let id = data.entity_id()?;
        immutable(&changes.name, "name")?;

        self.client
            .modify_initiator(InitiatorChanges {
                initiator_id: id,
                alias: changes.alias.clone(),
                attributes: changes.attributes.clone(),
                volume_access_group_id: changes.volume_access_group_id,
            })
            .await?;

        let fields = &mut data.fields;
        overlay(&mut fields.alias, &changes.alias);
        overlay(&mut fields.attributes, &changes.attributes);
        overlay(&mut fields.volume_access_group_id, &changes.volume_access_group_id);
        info!("Updated initiator {}", id);
        Ok(())
    }

    async fn delete(&self, data: &mut ResourceData<InitiatorFields>) -> Result<()> {
        let id = data.entity_id()?;
        self.client.delete_initiator(id).await?;
        data.clear_id();
        info!("Deleted initiator {}", id);
        Ok(())
    }

    async fn exists(&self, data: &mut ResourceData<InitiatorFields>) -> Result<bool> {
        let id = data.entity_id()?;
        let outcome = self.client.get_initiator_by_id(id).await;
        settle_exists(data, self.kind(), outcome)
    }
}
