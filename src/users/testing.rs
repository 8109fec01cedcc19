//! In-memory `UserRepo` used by handler tests.

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{
    repo::UserRepo,
    repo_types::{
        NewUser, PostTitle, PublicUser, User, UserComment, UserPatch, UserPost,
        UserWithAssociations,
    },
};

#[derive(Default)]
struct Tables {
    next_id: i32,
    users: BTreeMap<i32, User>,
    posts: Vec<(i32, UserPost)>,
    comments: Vec<(i32, UserComment)>,
    votes: Vec<(i32, i32)>,
}

#[derive(Default)]
pub struct MemoryUserRepo {
    tables: RwLock<Tables>,
    broken: AtomicBool,
}

impl MemoryUserRepo {
    /// Every call fails from now on, like a dropped database.
    pub fn break_connection(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }
        Ok(())
    }

    pub async fn stored(&self, id: i32) -> Option<User> {
        self.tables.read().await.users.get(&id).cloned()
    }

    pub async fn add_post(&self, user_id: i32, title: &str) -> i32 {
        let mut t = self.tables.write().await;
        let id = t.posts.len() as i32 + 1;
        t.posts.push((
            user_id,
            UserPost {
                id,
                title: title.into(),
                post_url: format!("https://example.com/{id}"),
                created_at: OffsetDateTime::now_utc(),
            },
        ));
        id
    }

    pub async fn add_comment(&self, user_id: i32, post_id: i32, text: &str) {
        let mut t = self.tables.write().await;
        let title = t
            .posts
            .iter()
            .find(|(_, p)| p.id == post_id)
            .map(|(_, p)| p.title.clone())
            .unwrap_or_default();
        let id = t.comments.len() as i32 + 1;
        t.comments.push((
            user_id,
            UserComment {
                id,
                comment_text: text.into(),
                created_at: OffsetDateTime::now_utc(),
                post: PostTitle { title },
            },
        ));
    }

    pub async fn add_vote(&self, user_id: i32, post_id: i32) {
        self.tables.write().await.votes.push((user_id, post_id));
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn list(&self) -> anyhow::Result<Vec<PublicUser>> {
        self.check()?;
        let t = self.tables.read().await;
        Ok(t.users.values().cloned().map(PublicUser::from).collect())
    }

    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<PublicUser>> {
        self.check()?;
        Ok(self.stored(id).await.map(PublicUser::from))
    }

    async fn find_with_associations(
        &self,
        id: i32,
    ) -> anyhow::Result<Option<UserWithAssociations>> {
        self.check()?;
        let t = self.tables.read().await;
        let Some(user) = t.users.get(&id).cloned() else {
            return Ok(None);
        };
        let posts = t
            .posts
            .iter()
            .filter(|(owner, _)| *owner == id)
            .map(|(_, p)| p.clone())
            .collect();
        let comments = t
            .comments
            .iter()
            .filter(|(owner, _)| *owner == id)
            .map(|(_, c)| c.clone())
            .collect();
        let voted_posts = t
            .votes
            .iter()
            .filter(|(voter, _)| *voter == id)
            .filter_map(|(_, post_id)| t.posts.iter().find(|(_, p)| p.id == *post_id))
            .map(|(_, p)| PostTitle {
                title: p.title.clone(),
            })
            .collect();
        Ok(Some(UserWithAssociations {
            user: user.into(),
            posts,
            comments,
            voted_posts,
        }))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.check()?;
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, new: NewUser) -> anyhow::Result<User> {
        self.check()?;
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.email == new.email) {
            anyhow::bail!("duplicate key value violates unique constraint \"users_email_key\"");
        }
        t.next_id += 1;
        let user = User {
            id: t.next_id,
            username: new.username,
            email: new.email,
            password: new.password_hash,
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: i32, patch: UserPatch) -> anyhow::Result<u64> {
        self.check()?;
        let mut t = self.tables.write().await;
        if let Some(email) = &patch.email {
            if t.users.values().any(|u| u.id != id && &u.email == email) {
                anyhow::bail!("duplicate key value violates unique constraint \"users_email_key\"");
            }
        }
        let Some(user) = t.users.get_mut(&id) else {
            return Ok(0);
        };
        if let Some(username) = patch.username {
            user.username = username;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(hash) = patch.password_hash {
            user.password = hash;
        }
        Ok(1)
    }

    async fn delete(&self, id: i32) -> anyhow::Result<u64> {
        self.check()?;
        let mut t = self.tables.write().await;
        if t.users.remove(&id).is_none() {
            return Ok(0);
        }
        t.posts.retain(|(owner, _)| *owner != id);
        t.comments.retain(|(owner, _)| *owner != id);
        t.votes.retain(|(voter, _)| *voter != id);
        Ok(1)
    }
}
