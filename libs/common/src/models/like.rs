//! Like model
//!
//! A like points at exactly one target. The target is an enum rather than two
//! nullable columns so "video xor comment" holds by construction.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// What a like points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum LikeTarget {
    Video(Uuid),
    Comment(Uuid),
}

/// Discriminant of [`LikeTarget`], used for bulk lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTargetKind {
    Video,
    Comment,
}

impl LikeTarget {
    pub fn id(&self) -> Uuid {
        match self {
            LikeTarget::Video(id) | LikeTarget::Comment(id) => *id,
        }
    }

    pub fn kind(&self) -> LikeTargetKind {
        match self {
            LikeTarget::Video(_) => LikeTargetKind::Video,
            LikeTarget::Comment(_) => LikeTargetKind::Comment,
        }
    }
}

/// Like entity
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: Uuid,
    pub target: LikeTarget,
    pub liked_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Row shape of the `likes` table
#[derive(Debug, FromRow)]
pub(crate) struct LikeRow {
    pub id: Uuid,
    pub video_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub liked_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<LikeRow> for Like {
    type Error = String;

    fn try_from(row: LikeRow) -> Result<Self, Self::Error> {
        let target = match (row.video_id, row.comment_id) {
            (Some(video_id), None) => LikeTarget::Video(video_id),
            (None, Some(comment_id)) => LikeTarget::Comment(comment_id),
            _ => return Err(format!("like {} must reference exactly one target", row.id)),
        };

        Ok(Like {
            id: row.id,
            target,
            liked_by: row.liked_by,
            created_at: row.created_at,
        })
    }
}
