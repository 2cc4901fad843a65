//! Pet listing from `user.getSelf`.

use crate::gateway::GatewayError;
use crate::gateway::endpoints::USER_GET_SELF;
use crate::jobs::Session;
use serde_json::Value;

/// A pet owned by the account.
#[derive(Debug, Clone, PartialEq)]
pub struct Pet {
    /// Identifier exactly as the service returned it.
    pub id: Value,
    pub level: i64,
}

impl Pet {
    /// Identifier rendered for logs and messages.
    pub fn label(&self) -> String {
        match &self.id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Extract pets from a `user.getSelf` body (`user.regions[].pet`).
///
/// Regions without a pet, and pets without an `_id`, are skipped. A missing
/// or non-numeric level counts as 0.
pub fn parse_pets(body: &Value) -> Vec<Pet> {
    let Some(regions) = body.pointer("/user/regions").and_then(Value::as_array) else {
        return Vec::new();
    };

    regions
        .iter()
        .filter_map(|region| region.get("pet"))
        .filter_map(|pet| {
            let id = pet.get("_id").filter(|id| !id.is_null())?.clone();
            let level = pet.get("level").and_then(level_of).unwrap_or(0);
            Some(Pet { id, level })
        })
        .collect()
}

pub(crate) fn level_of(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

pub async fn fetch_pets(session: &Session) -> std::result::Result<Vec<Pet>, GatewayError> {
    let body = session.call(USER_GET_SELF, None).await?;
    Ok(parse_pets(&body))
}
