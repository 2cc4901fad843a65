//! Loot box opening against a mocked game service.

use crate::helpers::session;
use gatto::config::LootBoxConfig;
use gatto::jobs::loot_box::open_loot_boxes;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

fn listing(offset: u32) -> MockBuilder {
    Mock::given(method("POST"))
        .and(path("/warehouseGoods.getByLimit"))
        .and(body_partial_json(json!({"type": "boxes", "offset": offset})))
}

fn open(id: &str) -> MockBuilder {
    Mock::given(method("POST"))
        .and(path("/box.open"))
        .and(body_json(json!({"id": id})))
}

#[tokio::test]
async fn empty_listing_reports_zero() {
    let server = MockServer::start().await;
    listing(0)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (session, notifier) = session(&server);
    let report = open_loot_boxes(&session, &LootBoxConfig::default()).await.unwrap();

    assert_eq!(report.opened, 0);
    assert_eq!(report.totals.currency("soft"), 0.0);
    assert_eq!(notifier.messages(), vec!["📦 Loot boxes opened: 0".to_owned()]);
}

#[tokio::test]
async fn aggregates_across_pages_and_skips_failures() {
    let server = MockServer::start().await;
    listing(0)
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [{"_id": "b1"}, {"_id": "b2"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    // b2 stays in the warehouse after failing, so the next page skips it.
    listing(1)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"_id": "b3"}])))
        .expect(1)
        .mount(&server)
        .await;
    open("b1")
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "soft": 10,
            "ton": 0.25,
            "resultSkins": [{"name": "Tabby", "rarity": "epic"}]
        })))
        .mount(&server)
        .await;
    open("b2")
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    open("b3")
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "soft": 5,
            "resultEggs": [{"allowedRegion": "desert", "rarity": "rare"}]
        })))
        .mount(&server)
        .await;

    let config = LootBoxConfig {
        batch_size: 2,
        ..Default::default()
    };
    let (session, notifier) = session(&server);
    let report = open_loot_boxes(&session, &config).await.unwrap();

    assert_eq!(report.opened, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.totals.currency("soft"), 15.0);
    assert_eq!(report.totals.currency("ton"), 0.25);
    assert_eq!(report.totals.list("resultSkins").len(), 1);
    assert_eq!(report.totals.list("resultEggs").len(), 1);

    let message = notifier.messages().pop().unwrap();
    assert!(message.starts_with("📦 Loot boxes opened: 2 (failed: 1)"));
    assert!(message.contains("soft: 15"));
    assert!(message.contains("Skin: Tabby (epic)"));
    assert!(message.contains("Egg: desert (rare)"));
}

#[tokio::test]
async fn batch_cap_bounds_paging() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/warehouseGoods.getByLimit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"_id": "x"}])))
        .expect(3)
        .mount(&server)
        .await;
    open("x")
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"soft": 1})))
        .mount(&server)
        .await;

    let config = LootBoxConfig {
        batch_size: 1,
        max_batches: 3,
    };
    let (session, _) = session(&server);
    let report = open_loot_boxes(&session, &config).await.unwrap();
    assert_eq!(report.opened, 3);
    assert_eq!(report.totals.currency("soft"), 3.0);
}

#[tokio::test]
async fn first_listing_failure_fails_job() {
    let server = MockServer::start().await;
    listing(0)
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (session, notifier) = session(&server);
    assert!(open_loot_boxes(&session, &LootBoxConfig::default()).await.is_err());
    assert!(notifier.messages()[0].contains("could not load"));
}
