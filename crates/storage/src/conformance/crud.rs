use std::future::Future;

use dairyops_core::records::FeedStock;
use time::macros::date;

use super::{make_feed, token, TestResult};
use crate::{ListHints, RecordStore, StoreError};

pub(super) async fn run_crud_tests<T, F, Fut>(factory: &F) -> Vec<TestResult>
where
    T: RecordStore<FeedStock>,
    F: Fn(crate::BearerToken) -> Fut,
    Fut: Future<Output = T>,
{
    vec![
        TestResult::from_result(
            "crud",
            "list_empty_store",
            list_empty_store(factory).await,
        ),
        TestResult::from_result(
            "crud",
            "create_assigns_id_and_timestamps",
            create_assigns_id_and_timestamps(factory).await,
        ),
        TestResult::from_result(
            "crud",
            "create_keeps_inputs_and_derived",
            create_keeps_inputs_and_derived(factory).await,
        ),
        TestResult::from_result(
            "crud",
            "update_replaces_inputs_keeps_id",
            update_replaces_inputs_keeps_id(factory).await,
        ),
        TestResult::from_result(
            "crud",
            "delete_removes_record",
            delete_removes_record(factory).await,
        ),
        TestResult::from_result(
            "crud",
            "list_is_newest_first",
            list_is_newest_first(factory).await,
        ),
        TestResult::from_result(
            "crud",
            "update_missing_id_is_not_found",
            update_missing_id_is_not_found(factory).await,
        ),
        TestResult::from_result(
            "crud",
            "delete_missing_id_is_not_found",
            delete_missing_id_is_not_found(factory).await,
        ),
        TestResult::from_result(
            "crud",
            "undated_payload_is_rejected_by_field",
            undated_payload_is_rejected_by_field(factory).await,
        ),
    ]
}

async fn list_empty_store<T, F, Fut>(factory: &F) -> Result<(), String>
where
    T: RecordStore<FeedStock>,
    F: Fn(crate::BearerToken) -> Fut,
    Fut: Future<Output = T>,
{
    let s = factory(token()).await;
    let records = s
        .list(&token(), &ListHints::default())
        .await
        .map_err(|e| format!("list failed: {e}"))?;
    if !records.is_empty() {
        return Err(format!("expected empty list, got {} records", records.len()));
    }
    Ok(())
}

async fn create_assigns_id_and_timestamps<T, F, Fut>(factory: &F) -> Result<(), String>
where
    T: RecordStore<FeedStock>,
    F: Fn(crate::BearerToken) -> Fut,
    Fut: Future<Output = T>,
{
    let s = factory(token()).await;
    let stored = s
        .create(&token(), &make_feed(Some(date!(2024 - 01 - 05)), "Maize", "100"))
        .await
        .map_err(|e| format!("create failed: {e}"))?;
    if stored.id.is_none() {
        return Err("stored record has no id".to_string());
    }
    if stored.created_at.is_none() || stored.updated_at.is_none() {
        return Err("stored record is missing timestamps".to_string());
    }
    Ok(())
}

async fn create_keeps_inputs_and_derived<T, F, Fut>(factory: &F) -> Result<(), String>
where
    T: RecordStore<FeedStock>,
    F: Fn(crate::BearerToken) -> Fut,
    Fut: Future<Output = T>,
{
    let s = factory(token()).await;
    let payload = make_feed(Some(date!(2024 - 01 - 05)), "Maize", "100");
    let stored = s
        .create(&token(), &payload)
        .await
        .map_err(|e| format!("create failed: {e}"))?;
    if stored.inputs != payload.inputs {
        return Err(format!(
            "inputs changed on create: sent {:?}, got {:?}",
            payload.inputs, stored.inputs
        ));
    }
    if stored.derived != payload.derived {
        return Err(format!(
            "derived values changed on create: sent {:?}, got {:?}",
            payload.derived, stored.derived
        ));
    }
    Ok(())
}

async fn update_replaces_inputs_keeps_id<T, F, Fut>(factory: &F) -> Result<(), String>
where
    T: RecordStore<FeedStock>,
    F: Fn(crate::BearerToken) -> Fut,
    Fut: Future<Output = T>,
{
    let s = factory(token()).await;
    let stored = s
        .create(&token(), &make_feed(Some(date!(2024 - 01 - 05)), "Maize", "100"))
        .await
        .map_err(|e| format!("create failed: {e}"))?;
    let id = stored.id.clone().ok_or("stored record has no id")?;

    let edited = make_feed(Some(date!(2024 - 01 - 05)), "Hay", "40");
    let updated = s
        .update(&token(), &id, &edited)
        .await
        .map_err(|e| format!("update failed: {e}"))?;
    if updated.id.as_deref() != Some(id.as_str()) {
        return Err(format!("id changed on update: {:?} -> {:?}", id, updated.id));
    }
    if updated.inputs.feed_type != "Hay" {
        return Err(format!(
            "expected feed_type \"Hay\", got \"{}\"",
            updated.inputs.feed_type
        ));
    }

    let listed = s
        .list(&token(), &ListHints::default())
        .await
        .map_err(|e| format!("list failed: {e}"))?;
    if listed.len() != 1 {
        return Err(format!("expected 1 record after update, got {}", listed.len()));
    }
    Ok(())
}

async fn delete_removes_record<T, F, Fut>(factory: &F) -> Result<(), String>
where
    T: RecordStore<FeedStock>,
    F: Fn(crate::BearerToken) -> Fut,
    Fut: Future<Output = T>,
{
    let s = factory(token()).await;
    let stored = s
        .create(&token(), &make_feed(Some(date!(2024 - 01 - 05)), "Maize", "100"))
        .await
        .map_err(|e| format!("create failed: {e}"))?;
    let id = stored.id.ok_or("stored record has no id")?;
    s.delete(&token(), &id)
        .await
        .map_err(|e| format!("delete failed: {e}"))?;
    let listed = s
        .list(&token(), &ListHints::default())
        .await
        .map_err(|e| format!("list failed: {e}"))?;
    if listed.iter().any(|r| r.id.as_deref() == Some(id.as_str())) {
        return Err(format!("record {id} still listed after delete"));
    }
    Ok(())
}

async fn list_is_newest_first<T, F, Fut>(factory: &F) -> Result<(), String>
where
    T: RecordStore<FeedStock>,
    F: Fn(crate::BearerToken) -> Fut,
    Fut: Future<Output = T>,
{
    let s = factory(token()).await;
    for day in [date!(2024 - 01 - 10), date!(2024 - 03 - 02), date!(2024 - 02 - 14)] {
        s.create(&token(), &make_feed(Some(day), "Maize", "10"))
            .await
            .map_err(|e| format!("create failed: {e}"))?;
    }
    let listed = s
        .list(&token(), &ListHints::default())
        .await
        .map_err(|e| format!("list failed: {e}"))?;
    let dates: Vec<_> = listed.iter().filter_map(|r| r.inputs.date).collect();
    let expected = vec![date!(2024 - 03 - 02), date!(2024 - 02 - 14), date!(2024 - 01 - 10)];
    if dates != expected {
        return Err(format!("expected dates {:?}, got {:?}", expected, dates));
    }
    Ok(())
}

async fn update_missing_id_is_not_found<T, F, Fut>(factory: &F) -> Result<(), String>
where
    T: RecordStore<FeedStock>,
    F: Fn(crate::BearerToken) -> Fut,
    Fut: Future<Output = T>,
{
    let s = factory(token()).await;
    let result = s
        .update(
            &token(),
            "999",
            &make_feed(Some(date!(2024 - 01 - 05)), "Maize", "1"),
        )
        .await;
    match result {
        Err(StoreError::NotFound { id, .. }) if id == "999" => Ok(()),
        other => Err(format!("expected NotFound for id 999, got {:?}", other)),
    }
}

async fn delete_missing_id_is_not_found<T, F, Fut>(factory: &F) -> Result<(), String>
where
    T: RecordStore<FeedStock>,
    F: Fn(crate::BearerToken) -> Fut,
    Fut: Future<Output = T>,
{
    let s = factory(token()).await;
    match s.delete(&token(), "999").await {
        Err(StoreError::NotFound { .. }) => Ok(()),
        other => Err(format!("expected NotFound, got {:?}", other)),
    }
}

async fn undated_payload_is_rejected_by_field<T, F, Fut>(factory: &F) -> Result<(), String>
where
    T: RecordStore<FeedStock>,
    F: Fn(crate::BearerToken) -> Fut,
    Fut: Future<Output = T>,
{
    let s = factory(token()).await;
    match s.create(&token(), &make_feed(None, "Maize", "1")).await {
        Err(StoreError::Rejected(errors)) => {
            if errors.get("date").is_none() {
                return Err(format!("expected an error keyed to \"date\", got {errors}"));
            }
            Ok(())
        }
        other => Err(format!("expected Rejected, got {:?}", other)),
    }
}
