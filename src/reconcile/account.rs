//! Account reconciler
//!
//! Secrets are write-through: they are sent on create and update but never
//! read back into the local record.

use super::{overlay, settle_exists};
use crate::domain::ports::{required, Attributes, EntityKind, Resource, ResourceData};
use crate::element::{AddAccountRequest, ModifyAccountRequest};
use crate::error::Result;
use crate::rpc::ElementClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Account fields held by the driver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    /// Reported by the cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Reconciles Element accounts
#[derive(Debug, Clone)]
pub struct AccountResource {
    client: ElementClient,
}

impl AccountResource {
    pub fn new(client: ElementClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for AccountResource {
    type Fields = AccountFields;

    fn kind(&self) -> EntityKind {
        EntityKind::Account
    }

    async fn create(&self, data: &mut ResourceData<AccountFields>) -> Result<()> {
        let username = required(&data.fields.username, "username")?.clone();

        let id = self
            .client
            .add_account(&AddAccountRequest {
                username: username.clone(),
                initiator_secret: data.fields.initiator_secret.clone(),
                target_secret: data.fields.target_secret.clone(),
                attributes: data.fields.attributes.clone(),
            })
            .await?;

        data.set_id(id);
        info!("Created account: {} {}", username, id);

        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData<AccountFields>) -> Result<()> {
        let id = data.entity_id()?;
        let account = self.client.get_account_by_id(id).await?;
        debug!("Read account {}: {}", id, account.username);

        let fields = &mut data.fields;
        fields.username = Some(account.username);
        fields.attributes = account.attributes;
        fields.status = Some(account.status);
        Ok(())
    }

    async fn update(
        &self,
        data: &mut ResourceData<AccountFields>,
        changes: &AccountFields,
    ) -> Result<()> {
        let id = data.entity_id()?;

        self.client
            .modify_account(&ModifyAccountRequest {
                account_id: id,
                username: changes.username.clone(),
                initiator_secret: changes.initiator_secret.clone(),
                target_secret: changes.target_secret.clone(),
                attributes: changes.attributes.clone(),
            })
            .await?;

        let fields = &mut data.fields;
        overlay(&mut fields.username, &changes.username);
        overlay(&mut fields.initiator_secret, &changes.initiator_secret);
        overlay(&mut fields.target_secret, &changes.target_secret);
        overlay(&mut fields.attributes, &changes.attributes);
        info!("Updated account {}", id);
        Ok(())
    }

    async fn delete(&self, data: &mut ResourceData<AccountFields>) -> Result<()> {
        let id = data.entity_id()?;
        self.client.remove_account(id).await?;
        data.clear_id();
        info!("Removed account {}", id);
        Ok(())
    }

    async fn exists(&self, data: &mut ResourceData<AccountFields>) -> Result<bool> {
        let id = data.entity_id()?;
        let outcome = self.client.get_account_by_id(id).await;
        settle_exists(data, self.kind(), outcome)
    }
}
