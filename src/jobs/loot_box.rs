//! Loot box opening with aggregated rewards.

use crate::config::LootBoxConfig;
use crate::error::Result;
use crate::gateway::FailureKind;
use crate::gateway::endpoints::{BOX_OPEN, WAREHOUSE_GET_BY_LIMIT};
use crate::jobs::Session;
use crate::jobs::essence::{item_id, listing};
use crate::jobs::rewards::{RewardTotals, format_prizes};
use serde_json::json;
use tracing::{info, warn};

/// Result of one loot box run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LootReport {
    pub opened: u32,
    pub failed: u32,
    pub totals: RewardTotals,
}

impl LootReport {
    /// Chat message summarising the run.
    pub fn render(&self) -> String {
        let mut text = format!("📦 Loot boxes opened: {}", self.opened);
        if self.failed > 0 {
            text.push_str(&format!(" (failed: {})", self.failed));
        }
        if self.opened > 0 {
            text.push('\n');
            text.push_str(&format_prizes(&self.totals.to_body()));
        }
        text
    }
}

/// Open every loot box in the warehouse.
///
/// Opened boxes leave the listing, so the next page starts after the boxes
/// that failed to open. Paging stops at an empty or short page, or after
/// `max_batches` pages.
///
/// # Errors
///
/// Fails if the first listing cannot be fetched or the job is cancelled.
/// Later listing failures end the run with what was collected so far.
pub async fn open_loot_boxes(session: &Session, config: &LootBoxConfig) -> Result<LootReport> {
    let batch_size = config.batch_size.max(1);
    let mut report = LootReport::default();
    let mut offset: u32 = 0;

    for batch in 0..config.max_batches {
        let page = session
            .call(
                WAREHOUSE_GET_BY_LIMIT,
                Some(json!({"type": "boxes", "limit": batch_size, "offset": offset})),
            )
            .await;
        let body = match page {
            Ok(body) => body,
            Err(e) if e.kind() == FailureKind::Cancelled => return Err(e.into()),
            Err(e) if batch == 0 => {
                session
                    .notify("📦 Loot boxes: could not load the warehouse listing.")
                    .await;
                return Err(e.into());
            }
            Err(e) => {
                warn!("loot box listing failed at offset {offset}, stopping: {e}");
                break;
            }
        };

        let boxes = listing(&body);
        if boxes.is_empty() {
            break;
        }

        let mut failed_in_batch: u32 = 0;
        for item in boxes {
            let Some(id) = item_id(item) else {
                warn!("loot box without id skipped");
                failed_in_batch += 1;
                continue;
            };
            match session.call(BOX_OPEN, Some(json!({"id": id}))).await {
                Ok(reward) => {
                    report.opened += 1;
                    report.totals.absorb(&reward);
                }
                Err(e) if e.kind() == FailureKind::Cancelled => return Err(e.into()),
                Err(e) => {
                    warn!("box.open failed for {id}, skipping: {e}");
                    failed_in_batch += 1;
                }
            }
        }
        report.failed += failed_in_batch;

        if boxes.len() < batch_size as usize {
            break;
        }
        offset += failed_in_batch;
    }

    info!(
        "loot boxes done: opened={} failed={}",
        report.opened, report.failed
    );
    session.notify(&report.render()).await;
    Ok(report)
}
