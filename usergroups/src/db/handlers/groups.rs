//! Database repository for groups and their members.

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::{
        groups::{GroupCreateDBRequest, GroupDBResponse},
        users::UserDBResponse,
    },
};
use crate::db::handlers::users::User;
use crate::types::GroupId;
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

/// Filter for listing groups
#[derive(Debug, Clone)]
pub struct GroupFilter {
    pub skip: i64,
    pub limit: i64,
}

impl GroupFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Group {
    pub id: GroupId,
    pub name: String,
}

pub struct Groups<'c> {
    db: &'c mut SqliteConnection,
}

impl From<Group> for GroupDBResponse {
    fn from(group: Group) -> Self {
        Self {
            id: group.id,
            name: group.name,
        }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Groups<'c> {
    type CreateRequest = GroupCreateDBRequest;
    type Response = GroupDBResponse;
    type Id = GroupId;
    type Filter = GroupFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let group = sqlx::query_as::<_, Group>("INSERT INTO user_groups (name) VALUES (?) RETURNING id, name")
            .bind(&request.name)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(GroupDBResponse::from(group))
    }

    #[instrument(skip(self), fields(group_id = id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let group = sqlx::query_as::<_, Group>("SELECT id, name FROM user_groups WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(group.map(GroupDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let groups = sqlx::query_as::<_, Group>("SELECT id, name FROM user_groups ORDER BY name LIMIT ? OFFSET ?")
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(groups.into_iter().map(GroupDBResponse::from).collect())
    }
}

impl<'c> Groups<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Look up a group by its unique name (exact, case-sensitive match).
    #[instrument(skip(self), err)]
    pub async fn get_by_name(&mut self, name: &str) -> Result<Option<GroupDBResponse>> {
        let group = sqlx::query_as::<_, Group>("SELECT id, name FROM user_groups WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(group.map(GroupDBResponse::from))
    }

    /// All users whose group reference points at `group_id`, ordered by email.
    ///
    /// An unknown group yields an empty list rather than an error.
    #[instrument(skip(self), fields(group_id = group_id), err)]
    pub async fn get_group_users(&mut self, group_id: GroupId) -> Result<Vec<UserDBResponse>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE group_id = ? ORDER BY email")
            .bind(group_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(users.into_iter().map(UserDBResponse::from).collect())
    }
}
