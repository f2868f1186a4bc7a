//! Integration tests for the PostgreSQL record store
//!
//! These tests need a reachable database (`DATABASE_URL`) and are ignored by
//! default. Run them with `cargo test -- --ignored`.

use common::{
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    models::{LikeTarget, LikeTargetKind, NewComment, NewUser, NewVideo, PasswordHash},
    store::{PgStore, RecordStore},
};
use uuid::Uuid;

fn new_user(tag: &str) -> NewUser {
    NewUser {
        handle: format!("pg_{tag}"),
        email: format!("pg_{tag}@example.com"),
        display_name: "Integration".to_string(),
        avatar: "https://cdn.example.com/a.png".to_string(),
        cover_image: None,
        password_hash: PasswordHash::from_phc("$argon2id$placeholder".to_string()),
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_postgres_store_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;
    assert!(health_check(&pool).await?, "Database health check failed");
    run_migrations(&pool).await?;

    let store = PgStore::new(pool);
    let tag = Uuid::new_v4().simple().to_string();
    let user = store.insert_user(new_user(&tag)).await?;

    // Compare-and-swap on the refresh token column
    store.set_refresh_token(user.id, Some("first")).await?;
    assert!(store.swap_refresh_token(user.id, "first", Some("second")).await?);
    assert!(!store.swap_refresh_token(user.id, "first", Some("third")).await?);
    let reloaded = store.find_user(user.id).await?.expect("user exists");
    assert_eq!(reloaded.refresh_token_hash.as_deref(), Some("second"));

    // Deleting a comment removes its likes through the foreign key cascade
    let video = store
        .insert_video(NewVideo {
            video_file: "v.mp4".to_string(),
            thumbnail: "t.png".to_string(),
            title: "title".to_string(),
            description: "description".to_string(),
            duration: 12.5,
            is_published: true,
            owner_id: user.id,
        })
        .await?;
    let comment = store
        .insert_comment(NewComment {
            content: "hello".to_string(),
            video_id: video.id,
            owner_id: user.id,
        })
        .await?;
    store
        .insert_like(user.id, LikeTarget::Comment(comment.id))
        .await?;
    assert!(store.delete_comment(comment.id).await?);
    let likes = store
        .likes_for(LikeTargetKind::Comment, &[comment.id])
        .await?;
    assert!(likes.is_empty());

    assert!(store.delete_video(video.id).await?);
    Ok(())
}
