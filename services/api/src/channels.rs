//! Channel profiles and subscriptions

use tracing::info;
use uuid::Uuid;

use common::SharedStore;

use crate::{
    error::{ApiError, ApiResult},
    models::{ChannelProfile, SubscriberView, SubscriptionStatus},
    pipeline::{Page, Query, SortDirection, lookup, paginate},
};

fn channel_not_found() -> ApiError {
    ApiError::NotFound("Channel not found".to_string())
}

/// Channel and subscription operations
#[derive(Clone)]
pub struct ChannelService {
    store: SharedStore,
}

impl ChannelService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// A channel looked up by handle, with subscription counts and whether
    /// the viewer follows it
    pub async fn channel_profile(
        &self,
        handle: &str,
        viewer: Option<Uuid>,
    ) -> ApiResult<ChannelProfile> {
        let store = self.store.as_ref();
        let handle = handle.trim().to_lowercase();
        if handle.is_empty() {
            return Err(ApiError::Validation("Handle is required".to_string()));
        }

        let channel = store
            .find_user_by_handle(&handle)
            .await?
            .ok_or_else(channel_not_found)?;

        let subscribers = lookup::subscribers(store, [channel.id]).await?;
        let subscribed_to = lookup::subscriptions(store, [channel.id]).await?;

        Ok(ChannelProfile {
            subscribers_count: subscribers.count(channel.id),
            subscribed_to_count: subscribed_to.count(channel.id),
            is_subscribed: subscribers.contains(channel.id, viewer, |s| s.subscriber_id),
            id: channel.id,
            handle: channel.handle,
            display_name: channel.display_name,
            avatar: channel.avatar,
            cover_image: channel.cover_image,
        })
    }

    /// A page of the channel's subscribers, newest subscription first
    pub async fn channel_subscribers(
        &self,
        channel_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> ApiResult<Page<SubscriberView>> {
        let store = self.store.as_ref();
        if store.find_user(channel_id).await?.is_none() {
            return Err(channel_not_found());
        }

        let rows = store.subscriptions_to(&[channel_id]).await?;
        let query = Query::from_rows(rows)
            .filter(|s| s.channel_id == channel_id)
            .sort_by(|s| (s.created_at, s.id), SortDirection::Descending);
        let page = paginate(query, page, page_size)?;

        let subscribers = lookup::users(store, page.items.iter().map(|s| s.subscriber_id)).await?;

        Ok(page.map(|subscription| SubscriberView {
            subscriber: subscribers.denormalize(subscription.subscriber_id),
            subscribed_at: subscription.created_at,
        }))
    }

    /// Follow the channel, or unfollow it if already subscribed
    pub async fn toggle_subscription(
        &self,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> ApiResult<SubscriptionStatus> {
        if subscriber_id == channel_id {
            return Err(ApiError::Validation(
                "You cannot subscribe to your own channel".to_string(),
            ));
        }
        if self.store.find_user(channel_id).await?.is_none() {
            return Err(channel_not_found());
        }

        let subscribed = match self
            .store
            .find_subscription(subscriber_id, channel_id)
            .await?
        {
            Some(existing) => {
                self.store.delete_subscription(existing.id).await?;
                false
            }
            None => {
                self.store
                    .insert_subscription(subscriber_id, channel_id)
                    .await?;
                true
            }
        };

        info!(
            "User {} subscription to channel {} is now {}",
            subscriber_id, channel_id, subscribed
        );
        Ok(SubscriptionStatus {
            channel_id,
            subscribed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fixture, fixture, user};

    #[tokio::test]
    async fn test_profile_counts_and_viewer_flag() {
        let Fixture { store, alice, bob, .. } = fixture().await;
        let carol = user(&store, "carol").await;
        let channels = ChannelService::new(store);

        channels.toggle_subscription(bob.id, alice.id).await.unwrap();
        channels.toggle_subscription(carol.id, alice.id).await.unwrap();
        channels.toggle_subscription(alice.id, carol.id).await.unwrap();

        let profile = channels.channel_profile(" Alice ", Some(bob.id)).await.unwrap();
        assert_eq!(profile.id, alice.id);
        assert_eq!(profile.subscribers_count, 2);
        assert_eq!(profile.subscribed_to_count, 1);
        assert!(profile.is_subscribed);

        let anonymous = channels.channel_profile("alice", None).await.unwrap();
        assert!(!anonymous.is_subscribed);

        assert!(matches!(
            channels.channel_profile("nobody", None).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_toggle_subscription() {
        let Fixture { store, alice, bob, .. } = fixture().await;
        let channels = ChannelService::new(store);

        assert!(channels.toggle_subscription(bob.id, alice.id).await.unwrap().subscribed);
        assert!(!channels.toggle_subscription(bob.id, alice.id).await.unwrap().subscribed);

        assert!(matches!(
            channels.toggle_subscription(alice.id, alice.id).await,
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            channels.toggle_subscription(alice.id, Uuid::new_v4()).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_subscribers_newest_first() {
        let Fixture { store, alice, bob, .. } = fixture().await;
        let carol = user(&store, "carol").await;
        let channels = ChannelService::new(store);

        channels.toggle_subscription(bob.id, alice.id).await.unwrap();
        channels.toggle_subscription(carol.id, alice.id).await.unwrap();

        let page = channels.channel_subscribers(alice.id, 1, 10).await.unwrap();
        let handles: Vec<String> = page
            .items
            .iter()
            .map(|s| s.subscriber.as_ref().unwrap().handle.clone())
            .collect();
        assert_eq!(handles, vec!["carol", "bob"]);
    }
}
