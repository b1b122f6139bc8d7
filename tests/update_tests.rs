//! Integration tests for delta reconciliation and relationship sync.

mod common;

use common::{counting_processor, group_attributes, processor, seed_user};
use directory_sync::endpoint::{InMemoryDirectory, RequestMethod};
use directory_sync::error::EndpointError;
use directory_sync::{
    AttributeDelta, GroupProcessor, OperationOptions, SyncError, Uid, ValidationError,
};
use serde_json::json;
use std::sync::atomic::Ordering;

async fn unified_group(processor: &GroupProcessor<InMemoryDirectory>) -> Uid {
    let attrs =
        group_attributes("Design").with("groupTypes", json!(["Unified", "DynamicMembership"]));
    let uid = processor.create(&attrs).await.unwrap();
    processor.context().endpoint().clear_requests().await;
    uid
}

#[tokio::test]
async fn test_replace_only_delta_reads_once_and_writes_merged_array() {
    let processor = processor();
    let uid = unified_group(&processor).await;

    processor
        .update(
            &uid,
            &[AttributeDelta::add_remove(
                "groupTypes",
                vec![json!("Unified"), json!("Extra")],
                vec![json!("DynamicMembership")],
            )],
            &OperationOptions::new(),
        )
        .await
        .unwrap();

    let requests = processor.context().endpoint().requests().await;
    let reads: Vec<_> = requests
        .iter()
        .filter(|r| r.method == RequestMethod::Get)
        .collect();
    assert_eq!(reads.len(), 1);
    assert_eq!(reads[0].path, format!("/groups/{}", uid));
    assert_eq!(reads[0].query, "$select=groupTypes");

    let stored = processor
        .context()
        .endpoint()
        .group(uid.as_str())
        .await
        .unwrap();
    assert_eq!(stored["groupTypes"], json!(["Unified", "Extra"]));
}

#[tokio::test]
async fn test_direct_scalar_delta_issues_no_projection_read() {
    let processor = counting_processor();
    let uid = processor.create(&group_attributes("Support")).await.unwrap();
    let counts = &processor.context().endpoint().counts;
    let gets_before = counts.get.load(Ordering::SeqCst);

    processor
        .update(
            &uid,
            &[
                AttributeDelta::replace_single("description", "Tier 1"),
                AttributeDelta::replace_single("visibility", "Private"),
            ],
            &OperationOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(counts.get.load(Ordering::SeqCst), gets_before);
    assert_eq!(counts.update_no_content.load(Ordering::SeqCst), 1);

    let stored = processor
        .context()
        .endpoint()
        .inner()
        .group(uid.as_str())
        .await
        .unwrap();
    assert_eq!(stored["description"], "Tier 1");
    assert_eq!(stored["visibility"], "Private");
}

#[tokio::test]
async fn test_relationship_only_update_skips_patch() {
    let processor = processor();
    let uid = unified_group(&processor).await;

    processor
        .update(
            &uid,
            &[AttributeDelta::add("members", vec![json!("u1")])],
            &OperationOptions::new(),
        )
        .await
        .unwrap();

    let requests = processor.context().endpoint().requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, RequestMethod::Post);
    assert_eq!(requests[0].path, format!("/groups/{}/members/$ref", uid));
}

#[tokio::test]
async fn test_member_removal_never_adds_and_tolerates_absent_ids() {
    let processor = processor();
    let directory = processor.context().endpoint().clone();
    seed_user(&directory, "u1").await;
    let uid = processor
        .create(&group_attributes("Ops").with("members", json!(["u1"])))
        .await
        .unwrap();
    directory.clear_requests().await;

    let removal = [AttributeDelta::remove("members", vec![json!("u1")])];
    processor
        .update(&uid, &removal, &OperationOptions::new())
        .await
        .unwrap();
    // second removal targets an already-absent reference
    processor
        .update(&uid, &removal, &OperationOptions::new())
        .await
        .unwrap();

    // the absent reference is tolerated after one read confirms the group exists
    let requests = directory.requests().await;
    let methods: Vec<_> = requests.iter().map(|r| r.method).collect();
    assert_eq!(
        methods,
        vec![RequestMethod::Delete, RequestMethod::Delete, RequestMethod::Get]
    );
    assert_eq!(requests[2].path, format!("/groups/{}", uid));
    assert!(directory.members(uid.as_str()).await.is_empty());
}

#[tokio::test]
async fn test_relationship_removal_on_unknown_group_is_not_found() {
    let processor = processor();
    for relationship in ["members", "owners"] {
        let result = processor
            .update(
                &Uid::new("does-not-exist"),
                &[AttributeDelta::remove(relationship, vec![json!("u1")])],
                &OperationOptions::new(),
            )
            .await;
        assert!(result.unwrap_err().is_not_found(), "{}", relationship);
    }
}

#[tokio::test]
async fn test_relationship_addition_on_unknown_group_is_not_found() {
    let processor = processor();
    let result = processor
        .update(
            &Uid::new("does-not-exist"),
            &[AttributeDelta::add("members", vec![json!("u1")])],
            &OperationOptions::new(),
        )
        .await;
    assert!(result.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_member_addition_never_removes_and_tolerates_present_ids() {
    let processor = processor();
    let directory = processor.context().endpoint().clone();
    let uid = unified_group(&processor).await;

    let addition = [AttributeDelta::add("owners", vec![json!("o1"), json!("o2")])];
    processor
        .update(&uid, &addition, &OperationOptions::new())
        .await
        .unwrap();
    processor
        .update(&uid, &addition, &OperationOptions::new())
        .await
        .unwrap();

    let requests = directory.requests().await;
    assert_eq!(requests.len(), 4);
    assert!(requests.iter().all(|r| r.method == RequestMethod::Post));
    assert_eq!(directory.owners(uid.as_str()).await, vec!["o1", "o2"]);
}

#[tokio::test]
async fn test_mixed_update_order() {
    let processor = processor();
    let directory = processor.context().endpoint().clone();
    let uid = unified_group(&processor).await;

    processor
        .update(
            &uid,
            &[
                AttributeDelta::add("members", vec![json!("u1")]),
                AttributeDelta::replace_single("description", "Design team"),
                AttributeDelta::remove("groupTypes", vec![json!("DynamicMembership")]),
                AttributeDelta::add("owners", vec![json!("o1")]),
            ],
            &OperationOptions::new(),
        )
        .await
        .unwrap();

    let requests = directory.requests().await;
    let methods: Vec<_> = requests.iter().map(|r| r.method).collect();
    assert_eq!(
        methods,
        vec![
            RequestMethod::Get,
            RequestMethod::Patch,
            RequestMethod::Post,
            RequestMethod::Post
        ]
    );

    let patch = &requests[1];
    assert_eq!(
        patch.body,
        Some(json!({"groupTypes": ["Unified"], "description": "Design team"}))
    );
}

#[tokio::test]
async fn test_failed_projection_read_aborts_everything() {
    let processor = processor();
    let directory = processor.context().endpoint().clone();
    let uid = unified_group(&processor).await;
    directory
        .fail_requests(
            RequestMethod::Get,
            "/groups/",
            EndpointError::Remote {
                status: 503,
                code: "serviceUnavailable".to_string(),
                message: "try later".to_string(),
            },
        )
        .await;

    let result = processor
        .update(
            &uid,
            &[
                AttributeDelta::add("groupTypes", vec![json!("Extra")]),
                AttributeDelta::add("members", vec![json!("u1")]),
            ],
            &OperationOptions::new(),
        )
        .await;

    assert!(matches!(
        result,
        Err(SyncError::Remote(EndpointError::Remote { status: 503, .. }))
    ));
    assert_eq!(directory.requests().await.len(), 1);
    assert!(directory.members(uid.as_str()).await.is_empty());
}

#[tokio::test]
async fn test_update_unknown_group_is_not_found() {
    let processor = processor();
    let result = processor
        .update(
            &Uid::new("does-not-exist"),
            &[AttributeDelta::replace_single("description", "x")],
            &OperationOptions::new(),
        )
        .await;
    assert!(result.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_relationship_replacement_is_rejected_before_any_call() {
    let processor = counting_processor();
    let uid = processor.create(&group_attributes("Ops")).await.unwrap();
    let counts = &processor.context().endpoint().counts;
    let before = counts.total();

    let result = processor
        .update(
            &uid,
            &[AttributeDelta::replace("members", vec![json!("u1")])],
            &OperationOptions::new(),
        )
        .await;

    assert!(matches!(
        result,
        Err(SyncError::Validation(ValidationError::ReplacementDelta { .. }))
    ));
    assert_eq!(counts.total(), before);
    assert!(
        processor
            .context()
            .endpoint()
            .inner()
            .members(uid.as_str())
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn test_mixed_delta_is_rejected_before_any_call() {
    let processor = counting_processor();
    let uid = processor.create(&group_attributes("Ops")).await.unwrap();
    let counts = &processor.context().endpoint().counts;
    let before = counts.total();

    let mut mixed = AttributeDelta::add("groupTypes", vec![json!("Unified")]);
    mixed.values_to_replace = Some(Vec::new());
    let result = processor
        .update(&uid, &[mixed], &OperationOptions::new())
        .await;

    assert!(matches!(
        result,
        Err(SyncError::Validation(ValidationError::MixedDelta { .. }))
    ));
    assert_eq!(counts.total(), before);
}

#[tokio::test]
async fn test_query_options_do_not_change_update_requests() {
    let deltas = [
        AttributeDelta::add("groupTypes", vec![json!("Extra")]),
        AttributeDelta::replace_single("description", "Same either way"),
        AttributeDelta::add("owners", vec![json!("o1")]),
    ];
    let options = [
        OperationOptions::new(),
        OperationOptions::new()
            .with_attributes_to_get(["members", "owners"])
            .with_page_size(5),
    ];

    let mut recorded = Vec::new();
    for options in &options {
        let processor = processor();
        let uid = unified_group(&processor).await;
        processor.update(&uid, &deltas, options).await.unwrap();

        let requests = processor.context().endpoint().requests().await;
        recorded.push(
            requests
                .iter()
                .map(|r| (r.method, r.path.replace(uid.as_str(), "{id}"), r.query.clone()))
                .collect::<Vec<_>>(),
        );
    }

    assert_eq!(recorded[0], recorded[1]);
    assert_eq!(recorded[0].len(), 3);
}
