use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String, // argon2 hash, not exposed in JSON
}

/// User columns that are safe to hand to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PublicUser {
    pub id: i32,
    pub username: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
        }
    }
}

/// Row ready for INSERT; `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Columns to SET on UPDATE. `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password_hash.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct UserPost {
    pub id: i32,
    pub title: String,
    pub post_url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostTitle {
    pub title: String,
}

#[derive(Debug, FromRow)]
pub struct UserCommentRow {
    pub id: i32,
    pub comment_text: String,
    pub created_at: OffsetDateTime,
    pub post_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserComment {
    pub id: i32,
    pub comment_text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub post: PostTitle,
}

impl From<UserCommentRow> for UserComment {
    fn from(r: UserCommentRow) -> Self {
        Self {
            id: r.id,
            comment_text: r.comment_text,
            created_at: r.created_at,
            post: PostTitle {
                title: r.post_title,
            },
        }
    }
}

/// A user together with what they wrote and voted on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserWithAssociations {
    #[serde(flatten)]
    pub user: PublicUser,
    pub posts: Vec<UserPost>,
    pub comments: Vec<UserComment>,
    pub voted_posts: Vec<PostTitle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UserDetails {
    Flat(PublicUser),
    Nested(UserWithAssociations),
}
