//! Routine pet care: feeding, playing and prize collection.

use crate::error::{BotError, Result};
use crate::gateway::endpoints::{ADS_WATCH, PET_FEED, PET_GET_ALL_STATS, PET_GET_PRIZE, PET_PLAY};
use crate::gateway::{FailureKind, GatewayError};
use crate::jobs::Session;
use crate::jobs::pets::fetch_pets;
use crate::jobs::rewards::format_prizes;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

/// Refresh pet stats before acting on them. Failure is logged only.
pub async fn warm_up(session: &Session, delay: Duration) {
    if let Err(e) = session.call(PET_GET_ALL_STATS, None).await {
        warn!("stats warm-up failed: {e}");
    }
    session.pause(delay).await;
}

fn cancelled(e: &GatewayError) -> bool {
    e.kind() == FailureKind::Cancelled
}

pub async fn feed_cats(session: &Session, warmup: Duration) -> Result<()> {
    info!("feeding pets");
    warm_up(session, warmup).await;

    match session.call(PET_FEED, Some(json!({"all": true}))).await {
        Ok(_) => {
            info!("pets fed");
            Ok(())
        }
        Err(e) => {
            if !cancelled(&e) {
                session.notify("🍗 Feeding failed: the game did not respond.").await;
            }
            Err(e.into())
        }
    }
}

pub async fn get_prize(session: &Session, warmup: Duration) -> Result<()> {
    info!("collecting prizes");
    warm_up(session, warmup).await;

    match session.call(PET_GET_PRIZE, Some(json!({"all": true}))).await {
        Ok(body) => {
            let summary = format_prizes(&body);
            info!("prizes collected: {}", summary.replace('\n', "; "));
            session.notify(&format!("🎁 Prizes:\n{summary}")).await;
            Ok(())
        }
        Err(e) => {
            match e.kind() {
                FailureKind::Cancelled => {}
                FailureKind::MalformedBody => {
                    session
                        .notify("🎁 Prize response could not be read (invalid JSON).")
                        .await;
                }
                _ => session.notify("🎁 Prizes not received (request failed).").await,
            }
            Err(e.into())
        }
    }
}

/// Play with every pet, then watch the rewarded ad for each one.
///
/// A failed play call is reported but the ads still run; the job fails at
/// the end in that case.
pub async fn play_game(session: &Session, warmup: Duration) -> Result<()> {
    info!("playing with pets");
    warm_up(session, warmup).await;

    let play_error = match session.call(PET_PLAY, Some(json!({"all": true}))).await {
        Ok(_) => None,
        Err(e) if cancelled(&e) => return Err(e.into()),
        Err(e) => {
            session.notify("🎮 Play failed: pet.play request failed.").await;
            Some(e)
        }
    };

    let pets = match fetch_pets(session).await {
        Ok(pets) => pets,
        Err(e) if cancelled(&e) => return Err(e.into()),
        Err(e) => {
            warn!("cannot list pets for ads: {e}");
            Vec::new()
        }
    };

    let mut watched = 0usize;
    for pet in &pets {
        let payload = json!({"id": pet.id, "alias": "pet.play"});
        match session.call(ADS_WATCH, Some(payload)).await {
            Ok(_) => watched += 1,
            Err(e) if cancelled(&e) => return Err(e.into()),
            Err(e) => warn!("ad for pet {} failed: {e}", pet.label()),
        }
    }
    info!("play finished, ads watched for {watched}/{} pets", pets.len());

    match play_error {
        Some(e) => Err(BotError::from(e)),
        None => Ok(()),
    }
}
