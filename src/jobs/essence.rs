//! Essence application: level pets up until the target or until the
//! supply runs out.

use crate::config::EssenceConfig;
use crate::error::Result;
use crate::gateway::endpoints::{ESSENCE_ACTIVATE, WAREHOUSE_GET_BY_LIMIT};
use crate::gateway::{FailureKind, GatewayError};
use crate::jobs::Session;
use crate::jobs::pets::{Pet, fetch_pets, level_of};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

/// What the job achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EssenceSummary {
    /// Pets below the target level when the job started.
    pub candidates: usize,
    /// Successful `essence.activate` calls.
    pub applied: u32,
    /// Pets that reached the target level.
    pub improved: u32,
    /// Pets given up on (call failure, item without id or attempt cap).
    pub abandoned: u32,
    /// The job stopped because no essence was left.
    pub supply_exhausted: bool,
}

impl EssenceSummary {
    fn totals(&self) -> String {
        format!(
            "Essences applied: {}\nPets improved: {}",
            self.applied, self.improved
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PetOutcome {
    Reached,
    Abandoned,
    SupplyExhausted,
}

/// Pick the first item of a warehouse listing (array or `{"data": [...]}`).
pub fn first_item(body: &Value) -> Option<&Value> {
    listing(body).first()
}

pub(crate) fn listing(body: &Value) -> &[Value] {
    body.as_array()
        .or_else(|| body.get("data").and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Item identifier from `_id`, falling back to `id`.
pub fn item_id(item: &Value) -> Option<Value> {
    ["_id", "id"]
        .into_iter()
        .filter_map(|key| item.get(key))
        .find(|id| id.is_string() || id.is_number())
        .cloned()
}

/// Run the essence job.
///
/// # Errors
///
/// Fails when the pet listing or an essence lookup cannot be fetched, or
/// when the job is cancelled. Activation failures only abandon the pet.
pub async fn apply_essences(session: &Session, config: &EssenceConfig) -> Result<EssenceSummary> {
    let target = config.target_level;
    let pets = match fetch_pets(session).await {
        Ok(pets) => pets,
        Err(e) => {
            if e.kind() != FailureKind::Cancelled {
                session
                    .notify("✨ Essence application failed: could not load pets.")
                    .await;
            }
            return Err(e.into());
        }
    };

    let candidates: Vec<Pet> = pets.into_iter().filter(|p| p.level < target).collect();
    let mut summary = EssenceSummary {
        candidates: candidates.len(),
        ..Default::default()
    };

    if candidates.is_empty() {
        info!("no pets below level {target}");
        session.notify(&format!("✨ No pets below level {target}.")).await;
        return Ok(summary);
    }

    session
        .notify(&format!(
            "✨ Starting essence application. Pets below level {target}: {}",
            candidates.len()
        ))
        .await;

    for pet in &candidates {
        match level_up(session, config, pet, &mut summary).await? {
            PetOutcome::Reached => summary.improved += 1,
            PetOutcome::Abandoned => summary.abandoned += 1,
            PetOutcome::SupplyExhausted => {
                summary.supply_exhausted = true;
                info!("essence supply exhausted after {} activations", summary.applied);
                let message = format!("✨ Essences ran out.\n{}", summary.totals());
                session.notify(&message).await;
                return Ok(summary);
            }
        }
    }

    info!(
        "essence application finished: applied={} improved={} abandoned={}",
        summary.applied, summary.improved, summary.abandoned
    );
    session
        .notify(&format!("✨ Essence application finished.\n{}", summary.totals()))
        .await;
    Ok(summary)
}

async fn level_up(
    session: &Session,
    config: &EssenceConfig,
    pet: &Pet,
    summary: &mut EssenceSummary,
) -> Result<PetOutcome> {
    let target = config.target_level;
    let pet_label = pet.label();
    let mut level = pet.level;

    for attempt in 1..=config.max_attempts_per_pet {
        let lookup = session
            .call(
                WAREHOUSE_GET_BY_LIMIT,
                Some(json!({"type": "essences", "limit": config.lookup_limit, "offset": 0})),
            )
            .await;
        let body = match lookup {
            Ok(body) => body,
            Err(e) => return Err(lookup_failed(session, e, summary).await),
        };

        let Some(item) = first_item(&body) else {
            return Ok(PetOutcome::SupplyExhausted);
        };
        let Some(essence_id) = item_id(item) else {
            warn!("essence item without id, abandoning pet {pet_label}");
            return Ok(PetOutcome::Abandoned);
        };

        let payload = json!({"petId": pet.id, "essenceId": essence_id});
        match session.call(ESSENCE_ACTIVATE, Some(payload)).await {
            Ok(response) => {
                summary.applied += 1;
                level = response.get("level").and_then(level_of).unwrap_or(level);
                debug!("pet {pet_label}: attempt {attempt}, level now {level}");
                if level >= target {
                    info!("pet {pet_label} reached level {level}");
                    return Ok(PetOutcome::Reached);
                }
            }
            Err(e) if e.kind() == FailureKind::Cancelled => return Err(e.into()),
            Err(e) => {
                warn!("essence.activate failed for pet {pet_label}, moving on: {e}");
                return Ok(PetOutcome::Abandoned);
            }
        }
    }

    warn!(
        "pet {pet_label} still at level {level} after {} activations, abandoning",
        config.max_attempts_per_pet
    );
    Ok(PetOutcome::Abandoned)
}

async fn lookup_failed(
    session: &Session,
    e: GatewayError,
    summary: &EssenceSummary,
) -> crate::error::BotError {
    if e.kind() != FailureKind::Cancelled {
        warn!("essence lookup failed: {e}");
        let message = format!("✨ Essence lookup failed, stopping.\n{}", summary.totals());
        session.notify(&message).await;
    }
    e.into()
}
