//! Entity models shared by every service

pub mod comment;
pub mod like;
pub mod subscription;
pub mod user;
pub mod video;

// Re-export for convenience
pub use comment::{Comment, NewComment};
pub use like::{Like, LikeTarget, LikeTargetKind};
pub use subscription::Subscription;
pub use user::{NewUser, PasswordHash, User, UserChanges, UserSummary};
pub use video::{NewVideo, Video, VideoChanges};
