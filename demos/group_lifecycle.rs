//! # Group Lifecycle Example
//!
//! Walks one group through create, update, query and delete against the
//! in-memory directory. Run with `RUST_LOG=debug` to see every request.

use directory_sync::endpoint::{EndpointContext, InMemoryDirectory};
use directory_sync::{
    AttributeDelta, AttributeSet, GroupFilter, GroupProcessor, OperationOptions, SyncConfig,
    SyncError,
};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let directory = InMemoryDirectory::new();
    for (id, upn) in [("u-ada", "ada@example.com"), ("u-linus", "linus@example.com")] {
        directory
            .insert_object(json!({"id": id, "userPrincipalName": upn}))
            .await;
    }

    let config = SyncConfig::builder().with_page_size(50).build()?;
    let processor = GroupProcessor::new(EndpointContext::new(directory.clone(), config)?);

    log::info!("Creating group");
    let uid = processor
        .create(
            &AttributeSet::new()
                .with("displayName", "Platform Engineering")
                .with("mailEnabled", false)
                .with("mailNickname", "platform-eng")
                .with("securityEnabled", true)
                .with("groupTypes", json!(["DynamicMembership"]))
                .with("owners", json!(["u-ada"])),
        )
        .await?;
    println!("Created group {}", uid);

    match processor
        .create(
            &AttributeSet::new()
                .with("displayName", "platform engineering")
                .with("mailEnabled", false)
                .with("mailNickname", "platform-eng-2")
                .with("securityEnabled", true),
        )
        .await
    {
        Err(SyncError::AlreadyExists { value, .. }) => println!("Rejected duplicate '{}'", value),
        other => println!("Unexpected duplicate outcome: {:?}", other),
    }

    log::info!("Updating group");
    processor
        .update(
            &uid,
            &[
                AttributeDelta::add_remove(
                    "groupTypes",
                    vec![json!("Unified")],
                    vec![json!("DynamicMembership")],
                ),
                AttributeDelta::replace_single("description", "Builds the platform"),
                AttributeDelta::add("members", vec![json!("u-ada"), json!("u-linus")]),
            ],
            &OperationOptions::new(),
        )
        .await?;

    let options = OperationOptions::new().with_attributes_to_get(["members", "owners"]);
    processor
        .query(
            Some(&GroupFilter::starts_with("displayName", "Platform")),
            false,
            &options,
            |group| {
                println!(
                    "{} {}: groupTypes={} members={} owners={}",
                    group.uid,
                    group.attributes.get_string("displayName").unwrap_or("?"),
                    group.attribute("groupTypes").unwrap_or(&json!(null)),
                    group.attribute("members").unwrap_or(&json!(null)),
                    group.attribute("owners").unwrap_or(&json!(null)),
                );
                true
            },
        )
        .await?;

    let memberships = processor
        .query_all(
            Some(&GroupFilter::equals("members", "u-linus")),
            &OperationOptions::new(),
        )
        .await?;
    println!("u-linus is a member of {} group(s)", memberships.len());

    log::info!("Deleting group");
    processor.delete(&uid).await?;
    println!(
        "Done: {} groups left, {} requests issued",
        directory.group_count().await,
        directory.requests().await.len()
    );

    Ok(())
}
