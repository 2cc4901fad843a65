//! Essence application against a mocked game service.

use crate::helpers::session;
use gatto::config::EssenceConfig;
use gatto::jobs::essence::apply_essences;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

fn pets(levels: &[(&str, i64)]) -> Value {
    let regions: Vec<Value> = levels
        .iter()
        .map(|(id, level)| json!({"pet": {"_id": id, "level": level}}))
        .collect();
    json!({"user": {"regions": regions}})
}

async fn mount_pets(server: &MockServer, levels: &[(&str, i64)]) {
    Mock::given(method("POST"))
        .and(path("/user.getSelf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pets(levels)))
        .mount(server)
        .await;
}

fn lookup() -> MockBuilder {
    Mock::given(method("POST"))
        .and(path("/warehouseGoods.getByLimit"))
        .and(body_partial_json(json!({"type": "essences", "offset": 0})))
}

fn activate() -> MockBuilder {
    Mock::given(method("POST")).and(path("/essence.activate"))
}

#[tokio::test]
async fn stops_at_first_empty_supply_lookup() {
    let server = MockServer::start().await;
    mount_pets(&server, &[("p1", 2), ("p2", 3)]).await;
    lookup()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"_id": "e1"}])))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    lookup()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;
    activate()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"level": 5})))
        .expect(2)
        .mount(&server)
        .await;

    let (session, notifier) = session(&server);
    let summary = apply_essences(&session, &EssenceConfig::default()).await.unwrap();

    assert!(summary.supply_exhausted);
    assert_eq!(summary.applied, 2);
    assert_eq!(summary.improved, 0);
    let messages = notifier.messages();
    assert!(messages[0].contains("Pets below level 10: 2"));
    assert!(messages.last().unwrap().contains("Essences ran out"));
    assert!(messages.last().unwrap().contains("Essences applied: 2"));
}

#[tokio::test]
async fn activations_are_capped_per_pet() {
    let server = MockServer::start().await;
    mount_pets(&server, &[("p1", 1), ("p2", 1)]).await;
    lookup()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "e1"}])))
        .mount(&server)
        .await;
    activate()
        .and(body_partial_json(json!({"petId": "p1", "essenceId": "e1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"level": 1})))
        .expect(3)
        .mount(&server)
        .await;
    activate()
        .and(body_partial_json(json!({"petId": "p2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"level": 1})))
        .expect(3)
        .mount(&server)
        .await;

    let config = EssenceConfig {
        max_attempts_per_pet: 3,
        ..Default::default()
    };
    let (session, _) = session(&server);
    let summary = apply_essences(&session, &config).await.unwrap();

    assert_eq!(summary.applied, 6);
    assert_eq!(summary.abandoned, 2);
    assert!(!summary.supply_exhausted);
}

#[tokio::test]
async fn failed_activation_skips_only_that_pet() {
    let server = MockServer::start().await;
    mount_pets(&server, &[("p1", 4), ("p2", 9), ("p3", 12)]).await;
    lookup()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"_id": "e9"}])))
        .mount(&server)
        .await;
    activate()
        .and(body_partial_json(json!({"petId": "p1"})))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;
    activate()
        .and(body_partial_json(json!({"petId": "p2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"level": 10})))
        .expect(1)
        .mount(&server)
        .await;

    let (session, notifier) = session(&server);
    let summary = apply_essences(&session, &EssenceConfig::default()).await.unwrap();

    assert_eq!(summary.candidates, 2);
    assert_eq!(summary.abandoned, 1);
    assert_eq!(summary.improved, 1);
    assert_eq!(summary.applied, 1);
    let last = notifier.messages().last().cloned().unwrap();
    assert!(last.contains("finished"));
    assert!(last.contains("Pets improved: 1"));
}

#[tokio::test]
async fn no_candidates_means_no_lookups() {
    let server = MockServer::start().await;
    mount_pets(&server, &[("p1", 10), ("p2", 15)]).await;
    lookup()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (session, notifier) = session(&server);
    let summary = apply_essences(&session, &EssenceConfig::default()).await.unwrap();

    assert_eq!(summary.candidates, 0);
    assert_eq!(notifier.messages(), vec!["✨ No pets below level 10.".to_owned()]);
}

#[tokio::test]
async fn item_without_id_abandons_pet() {
    let server = MockServer::start().await;
    mount_pets(&server, &[("p1", 1)]).await;
    lookup()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"type": "fire"}])))
        .mount(&server)
        .await;
    activate()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"level": 2})))
        .expect(0)
        .mount(&server)
        .await;

    let (session, _) = session(&server);
    let summary = apply_essences(&session, &EssenceConfig::default()).await.unwrap();
    assert_eq!(summary.abandoned, 1);
    assert_eq!(summary.applied, 0);
}

#[tokio::test]
async fn pet_listing_failure_fails_job() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user.getSelf"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (session, notifier) = session(&server);
    assert!(apply_essences(&session, &EssenceConfig::default()).await.is_err());
    assert!(notifier.messages()[0].contains("could not load pets"));
}
