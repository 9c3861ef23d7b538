//! Account accessors

use crate::domain::ports::{Attributes, EntityId, EntityKind};
use crate::error::{Error, Result};
use crate::rpc::ElementClient;
use serde::{Deserialize, Serialize};

// =============================================================================
// Wire Types
// =============================================================================

/// Account as reported by the cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "accountID")]
    pub account_id: EntityId,
    pub username: String,
    #[serde(default)]
    pub initiator_secret: String,
    #[serde(default)]
    pub target_secret: String,
    #[serde(default)]
    pub attributes: Option<Attributes>,
    #[serde(default)]
    pub status: String,
    /// Volumes owned by the account
    #[serde(default)]
    pub volumes: Vec<EntityId>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAccountRequest {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiator_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

#[derive(Debug, Clone, Deserialize)]
struct AddAccountResult {
    #[serde(rename = "accountID", default)]
    account_id: Option<EntityId>,
    #[serde(default)]
    account: Option<Account>,
}

#[derive(Debug, Clone, Serialize)]
struct GetAccountByIdRequest {
    #[serde(rename = "accountID")]
    account_id: EntityId,
}

#[derive(Debug, Clone, Deserialize)]
struct GetAccountByIdResult {
    account: Account,
}

/// Account modification; unset fields are left untouched remotely
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyAccountRequest {
    #[serde(rename = "accountID")]
    pub account_id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiator_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

#[derive(Debug, Clone, Serialize)]
struct RemoveAccountRequest {
    #[serde(rename = "accountID")]
    account_id: EntityId,
}

// =============================================================================
// Accessors
// =============================================================================

impl ElementClient {
    /// Create an account, returning its new ID
    pub async fn add_account(&self, request: &AddAccountRequest) -> Result<EntityId> {
        let result: AddAccountResult = self.call("AddAccount", request).await?;

        result
            .account_id
            .or(result.account.map(|a| a.account_id))
            .ok_or_else(|| Error::MissingId {
                method: "AddAccount".into(),
                kind: EntityKind::Account.to_string(),
            })
    }

    /// Fetch one account. An unknown ID comes back as `xUnknownAccount`.
    pub async fn get_account_by_id(&self, id: EntityId) -> Result<Account> {
        let result: GetAccountByIdResult = self
            .call("GetAccountByID", &GetAccountByIdRequest { account_id: id })
            .await?;
        Ok(result.account)
    }

    pub async fn modify_account(&self, request: &ModifyAccountRequest) -> Result<()> {
        self.call_api_method("ModifyAccount", Some(request)).await?;
        Ok(())
    }

    pub async fn remove_account(&self, id: EntityId) -> Result<()> {
        self.call_api_method("RemoveAccount", Some(&RemoveAccountRequest { account_id: id }))
            .await?;
        Ok(())
    }
}
