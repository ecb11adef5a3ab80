//! Deployment reconciler tests

use livesync::models::deployment::{Deployment, DeploymentPhase};
use livesync::models::events::PushMessage;
use livesync::reconcile::reconciler::{apply, DeploymentState, StatusTable};
use serde_json::{json, Value};

fn deployment(id: &str, created_at: &str) -> Deployment {
    serde_json::from_value(json!({
        "id": id,
        "application_id": "app",
        "created_at": created_at,
        "branch": "main"
    }))
    .unwrap()
}

fn message(action: &str, table: &str, data: Value) -> PushMessage {
    PushMessage {
        action: "message".to_string(),
        topic: "application/app/deployments".to_string(),
        data: Some(json!({
            "action": action,
            "table": table,
            "application_id": "app",
            "data": data
        })),
    }
}

fn insert(id: &str) -> PushMessage {
    message(
        "INSERT",
        "application_deployment",
        json!({"id": id, "application_id": "app", "created_at": "2025-03-01T00:00:00Z"}),
    )
}

fn status(id: &str, deployment_id: &str, phase: &str) -> PushMessage {
    message(
        "INSERT",
        "application_deployment_status",
        json!({"id": id, "deployment_id": deployment_id, "status": phase}),
    )
}

fn seeded() -> DeploymentState {
    DeploymentState::from_snapshot(vec![
        deployment("d3", "2025-01-03T00:00:00Z"),
        deployment("d2", "2025-01-02T00:00:00Z"),
        deployment("d1", "2025-01-01T00:00:00Z"),
    ])
}

fn ids(state: &DeploymentState) -> Vec<&str> {
    state.deployments().iter().map(|d| d.id.as_str()).collect()
}

#[test]
fn test_insert_prepends() {
    let state = seeded();
    let next = state.apply(&insert("d4")).unwrap();
    assert_eq!(ids(&next), vec!["d4", "d3", "d2", "d1"]);
    // the input snapshot is untouched
    assert_eq!(ids(&state), vec!["d3", "d2", "d1"]);
}

#[test]
fn test_insert_is_idempotent() {
    let state = seeded();
    let once = state.apply(&insert("d4")).unwrap();
    assert!(once.apply(&insert("d4")).is_none());

    let (list, statuses) = apply(once.deployments(), once.statuses(), &insert("d4"));
    assert_eq!(list, once.deployments());
    assert_eq!(&statuses, once.statuses());
}

#[test]
fn test_update_preserves_order() {
    let state = seeded();
    let update = message(
        "UPDATE",
        "application_deployment",
        json!({"id": "d2", "application_id": "app", "created_at": "2025-01-02T00:00:00Z", "branch": "release"}),
    );

    let next = state.apply(&update).unwrap();
    assert_eq!(ids(&next), vec!["d3", "d2", "d1"]);
    assert_eq!(next.get("d2").unwrap().extra["branch"], "release");
}

#[test]
fn test_update_of_unknown_deployment_is_noop() {
    let state = seeded();
    let update = message(
        "UPDATE",
        "application_deployment",
        json!({"id": "d9", "application_id": "app", "created_at": "2025-01-09T00:00:00Z"}),
    );
    assert!(state.apply(&update).is_none());
}

#[test]
fn test_orphan_status_dropped() {
    let state = seeded();
    assert!(state.apply(&status("s1", "d9", "building")).is_none());

    let (list, statuses) = apply(state.deployments(), &StatusTable::new(), &status("s1", "d9", "building"));
    assert_eq!(list.len(), 3);
    assert!(statuses.is_empty());
}

#[test]
fn test_status_last_write_wins() {
    let state = seeded();
    let next = state.apply(&status("s1", "d2", "building")).unwrap();
    let next = next.apply(&status("s2", "d2", "deployed")).unwrap();

    let current = next.status_of("d2").unwrap();
    assert_eq!(current.id, "s2");
    assert_eq!(current.status, DeploymentPhase::Deployed);
    assert_eq!(ids(&next), vec!["d3", "d2", "d1"]);
}

#[test]
fn test_malformed_messages_ignored() {
    let state = seeded();

    let mut wrong_action = insert("d4");
    wrong_action.action = "presence".to_string();
    assert!(state.apply(&wrong_action).is_none());

    let no_table = PushMessage {
        action: "message".to_string(),
        topic: "application/app/deployments".to_string(),
        data: Some(json!({"action": "INSERT", "data": {"id": "d4"}})),
    };
    assert!(state.apply(&no_table).is_none());

    let bad_row = message("INSERT", "application_deployment", json!({"id": "d4"}));
    assert!(state.apply(&bad_row).is_none());
}

#[test]
fn test_snapshot_seeds_statuses() {
    let snapshot: Vec<Deployment> = serde_json::from_value(json!([
        {
            "id": "d1",
            "created_at": "2025-01-01T00:00:00Z",
            "current_status": {"id": "s1", "deployment_id": "d1", "status": "failed"}
        },
        {"id": "d1", "created_at": "2025-01-01T00:00:00Z"}
    ]))
    .unwrap();

    let state = DeploymentState::from_snapshot(snapshot);
    assert_eq!(state.len(), 1);
    assert_eq!(state.status_of("d1").unwrap().status, DeploymentPhase::Failed);
}
