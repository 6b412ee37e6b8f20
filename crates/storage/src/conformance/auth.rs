use std::future::Future;

use dairyops_core::records::FeedStock;
use time::macros::date;

use super::{make_feed, token, TestResult};
use crate::{BearerToken, ListHints, RecordStore, StoreError};

pub(super) async fn run_auth_tests<T, F, Fut>(factory: &F) -> Vec<TestResult>
where
    T: RecordStore<FeedStock>,
    F: Fn(BearerToken) -> Fut,
    Fut: Future<Output = T>,
{
    vec![
        TestResult::from_result(
            "auth",
            "list_with_unknown_token",
            list_with_unknown_token(factory).await,
        ),
        TestResult::from_result(
            "auth",
            "create_with_unknown_token_changes_nothing",
            create_with_unknown_token_changes_nothing(factory).await,
        ),
        TestResult::from_result(
            "auth",
            "delete_with_unknown_token_keeps_record",
            delete_with_unknown_token_keeps_record(factory).await,
        ),
    ]
}

fn stranger() -> BearerToken {
    BearerToken::new("not-a-session")
}

async fn list_with_unknown_token<T, F, Fut>(factory: &F) -> Result<(), String>
where
    T: RecordStore<FeedStock>,
    F: Fn(BearerToken) -> Fut,
    Fut: Future<Output = T>,
{
    let s = factory(token()).await;
    match s.list(&stranger(), &ListHints::default()).await {
        Err(StoreError::Unauthenticated(_)) => Ok(()),
        other => Err(format!("expected Unauthenticated, got {:?}", other)),
    }
}

async fn create_with_unknown_token_changes_nothing<T, F, Fut>(factory: &F) -> Result<(), String>
where
    T: RecordStore<FeedStock>,
    F: Fn(BearerToken) -> Fut,
    Fut: Future<Output = T>,
{
    let s = factory(token()).await;
    let result = s
        .create(
            &stranger(),
            &make_feed(Some(date!(2024 - 01 - 05)), "Maize", "1"),
        )
        .await;
    if !matches!(result, Err(StoreError::Unauthenticated(_))) {
        return Err(format!("expected Unauthenticated, got {:?}", result));
    }
    let listed = s
        .list(&token(), &ListHints::default())
        .await
        .map_err(|e| format!("list failed: {e}"))?;
    if !listed.is_empty() {
        return Err(format!(
            "rejected create still stored {} records",
            listed.len()
        ));
    }
    Ok(())
}

async fn delete_with_unknown_token_keeps_record<T, F, Fut>(factory: &F) -> Result<(), String>
where
    T: RecordStore<FeedStock>,
    F: Fn(BearerToken) -> Fut,
    Fut: Future<Output = T>,
{
    let s = factory(token()).await;
    let stored = s
        .create(&token(), &make_feed(Some(date!(2024 - 01 - 05)), "Maize", "1"))
        .await
        .map_err(|e| format!("create failed: {e}"))?;
    let id = stored.id.ok_or("stored record has no id")?;
    match s.delete(&stranger(), &id).await {
        Err(StoreError::Unauthenticated(_)) => {}
        other => return Err(format!("expected Unauthenticated, got {:?}", other)),
    }
    let listed = s
        .list(&token(), &ListHints::default())
        .await
        .map_err(|e| format!("list failed: {e}"))?;
    if listed.len() != 1 {
        return Err(format!("expected record to survive, found {}", listed.len()));
    }
    Ok(())
}
