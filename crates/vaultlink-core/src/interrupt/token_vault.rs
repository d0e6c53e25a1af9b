//! Token vault interrupt payload recognition

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::consent::request::AuthorizationRequest;

/// Discriminant shared by every authorization interrupt
pub const INTERRUPT_NAME: &str = "AUTH0_AI_INTERRUPT";

/// Code raised when a tool needs a delegated token the backend does not hold
pub const TOKEN_VAULT_CODE: &str = "TOKEN_VAULT_ERROR";

/// Earlier name for [`TOKEN_VAULT_CODE`], still emitted by older backends
pub const LEGACY_FEDERATED_CODE: &str = "FEDERATED_CONNECTION_ERROR";

/// A recognized authorization-required interrupt
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenVaultInterrupt {
    pub name: String,
    pub code: String,
    pub message: String,
    pub connection: String,
    pub required_scopes: Vec<String>,
    #[serde(default)]
    pub authorization_params: Option<BTreeMap<String, String>>,
}

impl TokenVaultInterrupt {
    /// Parse `value` if it has the tagged interrupt shape. Never panics.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        let interrupt = Self::deserialize(value).ok()?;
        let tagged = interrupt.name == INTERRUPT_NAME
            && (interrupt.code == TOKEN_VAULT_CODE || interrupt.code == LEGACY_FEDERATED_CODE);
        (tagged && !interrupt.connection.is_empty()).then_some(interrupt)
    }

    pub fn into_request(self) -> AuthorizationRequest {
        AuthorizationRequest {
            connection: self.connection,
            required_scopes: self.required_scopes,
            authorization_params: self.authorization_params.unwrap_or_default(),
            resume: None,
        }
    }
}

/// Whether `value` is an authorization-required interrupt
pub fn is_authorization_interrupt(value: &Value) -> bool {
    TokenVaultInterrupt::from_value(value).is_some()
}
