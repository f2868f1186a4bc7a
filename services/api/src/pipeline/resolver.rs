//! Relation resolution over already-fetched records
//!
//! A [`Relation`] groups related records by the foreign key pointing at the
//! primary record, so counts, membership flags and denormalized lookups are
//! answered without going back to the store.

use std::collections::HashMap;
use uuid::Uuid;

/// Related records grouped by the id of the record they point at
#[derive(Debug, Clone)]
pub struct Relation<R> {
    by_key: HashMap<Uuid, Vec<R>>,
}

impl<R> Relation<R> {
    /// Group `records` by `foreign_key`
    pub fn group(records: impl IntoIterator<Item = R>, foreign_key: impl Fn(&R) -> Uuid) -> Self {
        let mut by_key: HashMap<Uuid, Vec<R>> = HashMap::new();
        for record in records {
            by_key.entry(foreign_key(&record)).or_default().push(record);
        }
        Self { by_key }
    }

    /// Number of records pointing at `primary`
    pub fn count(&self, primary: Uuid) -> u64 {
        self.by_key
            .get(&primary)
            .map_or(0, |records| records.len() as u64)
    }

    /// Whether a record pointing at `primary` has `viewer` as its secondary
    /// key; always false for an anonymous viewer
    pub fn contains(
        &self,
        primary: Uuid,
        viewer: Option<Uuid>,
        secondary_key: impl Fn(&R) -> Uuid,
    ) -> bool {
        let Some(viewer) = viewer else {
            return false;
        };
        self.by_key
            .get(&primary)
            .is_some_and(|records| records.iter().any(|record| secondary_key(record) == viewer))
    }

    /// First record pointing at `primary`
    pub fn first(&self, primary: Uuid) -> Option<&R> {
        self.by_key.get(&primary).and_then(|records| records.first())
    }

    /// First record pointing at `primary`, projected to `S`
    pub fn denormalize<S>(&self, primary: Uuid) -> Option<S>
    where
        S: for<'a> From<&'a R>,
    {
        self.first(primary).map(S::from)
    }
}

impl<R> Default for Relation<R> {
    fn default() -> Self {
        Self {
            by_key: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::models::{Like, LikeTarget, PasswordHash, User, UserSummary};

    fn like(target: Uuid, liked_by: Uuid) -> Like {
        Like {
            id: Uuid::new_v4(),
            target: LikeTarget::Comment(target),
            liked_by,
            created_at: Utc::now(),
        }
    }

    fn user(handle: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            handle: handle.to_string(),
            email: format!("{handle}@example.com"),
            display_name: handle.to_uppercase(),
            avatar: format!("https://cdn.example.com/{handle}.png"),
            cover_image: None,
            password_hash: PasswordHash::from_phc("$argon2id$secret".to_string()),
            refresh_token_hash: Some("digest".to_string()),
            watch_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_count_and_membership() {
        let (c1, c2, c3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let likes = Relation::group(
            vec![like(c1, a), like(c1, b), like(c2, b)],
            |l: &Like| l.target.id(),
        );

        assert_eq!(likes.count(c1), 2);
        assert_eq!(likes.count(c2), 1);
        assert_eq!(likes.count(c3), 0);

        assert!(likes.contains(c1, Some(a), |l| l.liked_by));
        assert!(!likes.contains(c2, Some(a), |l| l.liked_by));
        assert!(!likes.contains(c3, Some(a), |l| l.liked_by));
    }

    #[test]
    fn test_anonymous_viewer_is_never_a_member() {
        let target = Uuid::new_v4();
        let likes = Relation::group(vec![like(target, Uuid::new_v4())], |l: &Like| l.target.id());
        assert!(!likes.contains(target, None, |l| l.liked_by));
    }

    #[test]
    fn test_denormalize_projects_public_fields() {
        let alice = user("alice");
        let owners = Relation::group(vec![alice.clone()], |u: &User| u.id);

        let summary: UserSummary = owners.denormalize(alice.id).unwrap();
        assert_eq!(summary.handle, "alice");

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["displayName"], "ALICE");
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
        assert!(value.get("email").is_none());

        assert!(owners.denormalize::<UserSummary>(Uuid::new_v4()).is_none());
    }
}
