use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(UserId);
id_newtype!(PostId);
id_newtype!(CommentId);

/// Public profile of a user as known to the client.
///
/// `email` is only present when the API returns the caller's own profile
/// (login, signup, `/auth/me`); authors embedded in posts and comments omit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    /// Omitted by list endpoints, which only send the summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub author: Identity,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(default)]
    pub comments_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub author: Identity,
    pub post_id: PostId,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
