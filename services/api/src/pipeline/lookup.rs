//! Batched fetches feeding the resolver
//!
//! Each helper issues one store call for a whole page of primary records.

use std::collections::HashSet;
use uuid::Uuid;

use common::{
    RecordStore,
    error::DatabaseResult,
    models::{Like, LikeTargetKind, Subscription, User},
};

use super::Relation;

fn distinct(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Users keyed by their own id, for owner denormalization
pub async fn users(
    store: &dyn RecordStore,
    ids: impl IntoIterator<Item = Uuid>,
) -> DatabaseResult<Relation<User>> {
    let ids = distinct(ids);
    if ids.is_empty() {
        return Ok(Relation::default());
    }
    let users = store.find_users(&ids).await?;
    Ok(Relation::group(users, |user| user.id))
}

/// Likes keyed by the video or comment they target
pub async fn likes(
    store: &dyn RecordStore,
    kind: LikeTargetKind,
    target_ids: impl IntoIterator<Item = Uuid>,
) -> DatabaseResult<Relation<Like>> {
    let ids = distinct(target_ids);
    if ids.is_empty() {
        return Ok(Relation::default());
    }
    let likes = store.likes_for(kind, &ids).await?;
    Ok(Relation::group(likes, |like| like.target.id()))
}

/// Subscriptions keyed by the channel they follow
pub async fn subscribers(
    store: &dyn RecordStore,
    channel_ids: impl IntoIterator<Item = Uuid>,
) -> DatabaseResult<Relation<Subscription>> {
    let ids = distinct(channel_ids);
    if ids.is_empty() {
        return Ok(Relation::default());
    }
    let subscriptions = store.subscriptions_to(&ids).await?;
    Ok(Relation::group(subscriptions, |s| s.channel_id))
}

/// Subscriptions keyed by the subscriber holding them
pub async fn subscriptions(
    store: &dyn RecordStore,
    subscriber_ids: impl IntoIterator<Item = Uuid>,
) -> DatabaseResult<Relation<Subscription>> {
    let ids = distinct(subscriber_ids);
    if ids.is_empty() {
        return Ok(Relation::default());
    }
    let subscriptions = store.subscriptions_by(&ids).await?;
    Ok(Relation::group(subscriptions, |s| s.subscriber_id))
}
