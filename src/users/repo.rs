use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::repo_types::{
    NewUser, PostTitle, PublicUser, User, UserComment, UserCommentRow, UserPatch, UserPost,
    UserWithAssociations,
};

/// Storage seam for the user resource.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<PublicUser>>;
    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<PublicUser>>;
    async fn find_with_associations(&self, id: i32)
        -> anyhow::Result<Option<UserWithAssociations>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn insert(&self, new: NewUser) -> anyhow::Result<User>;
    /// Returns the number of rows affected.
    async fn update(&self, id: i32, patch: UserPatch) -> anyhow::Result<u64>;
    /// Returns the number of rows deleted.
    async fn delete(&self, id: i32) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn list(&self) -> anyhow::Result<Vec<PublicUser>> {
        let rows = sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT id, username, email
              FROM users
             ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<PublicUser>> {
        let user = sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT id, username, email
              FROM users
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_with_associations(
        &self,
        id: i32,
    ) -> anyhow::Result<Option<UserWithAssociations>> {
        let Some(user) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let posts = sqlx::query_as::<_, UserPost>(
            r#"
            SELECT id, title, post_url, created_at
              FROM posts
             WHERE user_id = $1
             ORDER BY created_at DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await
        .context("list posts by user")?;

        let comments = sqlx::query_as::<_, UserCommentRow>(
            r#"
            SELECT c.id, c.comment_text, c.created_at, p.title AS post_title
              FROM comments c
              JOIN posts p ON p.id = c.post_id
             WHERE c.user_id = $1
             ORDER BY c.created_at DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await
        .context("list comments by user")?;

        let voted: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT p.title
              FROM votes v
              JOIN posts p ON p.id = v.post_id
             WHERE v.user_id = $1
             ORDER BY v.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await
        .context("list voted posts by user")?;

        Ok(Some(UserWithAssociations {
            user,
            posts,
            comments: comments.into_iter().map(UserComment::from).collect(),
            voted_posts: voted
                .into_iter()
                .map(|(title,)| PostTitle { title })
                .collect(),
        }))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password
              FROM users
             WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn insert(&self, new: NewUser) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password
            "#,
        )
        .bind(new.username)
        .bind(new.email)
        .bind(new.password_hash)
        .fetch_one(&self.db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn update(&self, id: i32, patch: UserPatch) -> anyhow::Result<u64> {
        let mut qb = update_query(id, patch);
        let res = qb
            .build()
            .execute(&self.db)
            .await
            .context("update user")?;
        Ok(res.rows_affected())
    }

    async fn delete(&self, id: i32) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(res.rows_affected())
    }
}

fn update_query(id: i32, patch: UserPatch) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET ");
    if patch.is_empty() {
        // still touches the row so a missing id reports zero rows
        qb.push("id = id");
    } else {
        let mut set = qb.separated(", ");
        if let Some(username) = patch.username {
            set.push("username = ").push_bind_unseparated(username);
        }
        if let Some(email) = patch.email {
            set.push("email = ").push_bind_unseparated(email);
        }
        if let Some(hash) = patch.password_hash {
            set.push("password = ").push_bind_unseparated(hash);
        }
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb
}
