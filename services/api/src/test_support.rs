//! Shared fixtures for unit tests

use std::sync::Arc;

use common::{
    SharedStore,
    models::{NewUser, NewVideo, PasswordHash, User, Video},
    store::MemoryStore,
};
use uuid::Uuid;

pub struct Fixture {
    pub store: SharedStore,
    pub alice: User,
    pub bob: User,
    /// Published video owned by alice
    pub video: Video,
}

pub async fn user(store: &SharedStore, handle: &str) -> User {
    store
        .insert_user(NewUser {
            handle: handle.to_string(),
            email: format!("{handle}@example.com"),
            display_name: handle.to_string(),
            avatar: format!("https://cdn.example.com/{handle}.png"),
            cover_image: None,
            password_hash: PasswordHash::from_phc("$argon2id$stub".to_string()),
        })
        .await
        .unwrap()
}

pub async fn video(store: &SharedStore, owner_id: Uuid, title: &str, is_published: bool) -> Video {
    store
        .insert_video(NewVideo {
            video_file: format!("https://cdn.example.com/{title}.mp4"),
            thumbnail: format!("https://cdn.example.com/{title}.jpg"),
            title: title.to_string(),
            description: format!("About {title}"),
            duration: 42.0,
            is_published,
            owner_id,
        })
        .await
        .unwrap()
}

pub async fn fixture() -> Fixture {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let alice = user(&store, "alice").await;
    let bob = user(&store, "bob").await;
    let video = video(&store, alice.id, "intro", true).await;
    Fixture {
        store,
        alice,
        bob,
        video,
    }
}
