//! Idempotent sample-data seeding.
//!
//! [`run`] ensures every group in a [`SeedCatalog`] exists, then ensures every user exists and
//! is linked to its group. Running it again against a populated database changes nothing.
//!
//! # Failure policy
//!
//! - Groups are a prerequisite. They are created in one transaction; any failure rolls that
//!   transaction back and aborts the run with [`SeedError::Prerequisite`].
//! - Users are independent. Each record gets its own transaction covering creation and group
//!   assignment. A failure rolls back that record only, is reported as
//!   [`UserOutcome::Failed`], and the run moves on to the next record.
//! - A user that already exists is left untouched: no credential, flag or group changes.
//!
//! The whole run uses the single connection passed in by the caller. It assumes a single
//! writer; two concurrent runs can race on the unique constraints.

pub mod catalog;

pub use catalog::{SeedCatalog, SeedUser};

use crate::auth::identity::{IdentityStore, UserCreate};
use crate::db::{
    errors::DbError,
    handlers::{Groups, Repository, Users},
    models::groups::{GroupCreateDBRequest, GroupDBResponse},
};
use crate::errors::Error;
use sqlx::{Connection, SqliteConnection};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use tracing::{error, info, instrument, warn};

/// Errors that abort a seed run.
#[derive(ThisError, Debug)]
pub enum SeedError {
    /// Ensuring groups failed; nothing from the group step was committed
    #[error("failed to ensure groups: {0}")]
    Prerequisite(#[from] DbError),

    #[error("invalid seed catalog: {0}")]
    InvalidCatalog(String),
}

/// Groups resolved by [`ensure_groups`], keyed by name.
#[derive(Debug, Clone, Default)]
pub struct EnsuredGroups {
    pub by_name: HashMap<String, GroupDBResponse>,
    /// Names created by this run, in catalog order
    pub created: Vec<String>,
    /// Names that were already present, in catalog order
    pub existing: Vec<String>,
}

impl EnsuredGroups {
    pub fn get(&self, name: &str) -> Option<&GroupDBResponse> {
        self.by_name.get(name)
    }
}

/// What happened to one user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserOutcome {
    /// Created; `group` is the group it was linked to, if the name resolved
    Created { group: Option<String> },
    /// Already present, left as is
    Skipped,
    /// Creation or group assignment failed and was rolled back
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserReport {
    pub email: String,
    pub outcome: UserOutcome,
}

/// Result of a completed run. Per-record failures are listed here rather than returned as errors.
#[derive(Debug, Clone, Default)]
pub struct SeedReport {
    pub groups_created: Vec<String>,
    pub groups_existing: Vec<String>,
    pub users: Vec<UserReport>,
}

impl SeedReport {
    fn count(&self, pred: impl Fn(&UserOutcome) -> bool) -> usize {
        self.users.iter().filter(|u| pred(&u.outcome)).count()
    }

    pub fn users_created(&self) -> usize {
        self.count(|o| matches!(o, UserOutcome::Created { .. }))
    }

    pub fn users_skipped(&self) -> usize {
        self.count(|o| matches!(o, UserOutcome::Skipped))
    }

    pub fn users_failed(&self) -> usize {
        self.count(|o| matches!(o, UserOutcome::Failed { .. }))
    }

    /// One-line summary for the operator.
    pub fn summary(&self) -> String {
        format!(
            "groups: {} created, {} existing; users: {} created, {} existing, {} failed",
            self.groups_created.len(),
            self.groups_existing.len(),
            self.users_created(),
            self.users_skipped(),
            self.users_failed()
        )
    }
}

/// Make sure every named group exists, creating the missing ones in a single transaction.
///
/// Existing groups are reused without modification. If any lookup, insert or the commit
/// fails, the transaction is dropped (and so rolled back) and the error is returned.
#[instrument(skip_all, fields(count = names.len()), err)]
pub async fn ensure_groups(conn: &mut SqliteConnection, names: &[String]) -> Result<EnsuredGroups, SeedError> {
    let mut ensured = EnsuredGroups::default();
    let mut tx = conn.begin().await.map_err(DbError::from)?;

    for name in names {
        let mut groups = Groups::new(&mut tx);
        let group = match groups.get_by_name(name).await? {
            Some(existing) => {
                info!("Group '{}' already exists", name);
                ensured.existing.push(name.clone());
                existing
            }
            None => {
                let created = groups.create(&GroupCreateDBRequest::new(name.as_str())).await?;
                info!("Created group: {}", name);
                ensured.created.push(name.clone());
                created
            }
        };
        ensured.by_name.insert(name.clone(), group);
    }

    tx.commit().await.map_err(DbError::from)?;
    Ok(ensured)
}

/// Make sure every user exists and, when newly created, is linked to its group.
///
/// Never fails as a whole: each record's outcome is reported individually.
#[instrument(skip_all, fields(count = users.len()))]
pub async fn ensure_users<I>(conn: &mut SqliteConnection, identity: &I, users: &[SeedUser], groups: &EnsuredGroups) -> Vec<UserReport>
where
    I: IdentityStore + ?Sized,
{
    let mut reports = Vec::with_capacity(users.len());

    for spec in users {
        let outcome = match identity.find_by_email(conn, &spec.email).await {
            Ok(Some(_)) => {
                info!("User '{}' already exists", spec.email);
                UserOutcome::Skipped
            }
            Ok(None) => create_user(conn, identity, spec, groups).await,
            Err(e) if e.is_not_found() => create_user(conn, identity, spec, groups).await,
            Err(e) => {
                warn!("Failed to look up user {}: {}", spec.email, e);
                UserOutcome::Failed { reason: e.to_string() }
            }
        };

        reports.push(UserReport {
            email: spec.email.clone(),
            outcome,
        });
    }

    reports
}

async fn create_user<I>(conn: &mut SqliteConnection, identity: &I, spec: &SeedUser, groups: &EnsuredGroups) -> UserOutcome
where
    I: IdentityStore + ?Sized,
{
    match try_create_user(conn, identity, spec, groups).await {
        Ok(group) => {
            info!("Created user: {} (group: {})", spec.email, spec.group);
            UserOutcome::Created { group }
        }
        Err(e) => {
            error!("Failed to create user {}: {}", spec.email, e);
            UserOutcome::Failed { reason: e.to_string() }
        }
    }
}

/// Create one user and link its group inside a per-record transaction.
async fn try_create_user<I>(
    conn: &mut SqliteConnection,
    identity: &I,
    spec: &SeedUser,
    groups: &EnsuredGroups,
) -> Result<Option<String>, Error>
where
    I: IdentityStore + ?Sized,
{
    let mut tx = conn.begin().await.map_err(DbError::from)?;

    let request = UserCreate::new(spec.email.as_str(), spec.password.as_str()).with_superuser(spec.is_superuser);
    let user = identity.create(&mut tx, &request).await?;

    let linked = match groups.get(&spec.group) {
        Some(group) => {
            Users::new(&mut tx).set_group(user.id, Some(group.id)).await?;
            Some(group.name.clone())
        }
        None => {
            warn!("Group '{}' not found, user {} left without a group", spec.group, spec.email);
            None
        }
    };

    tx.commit().await.map_err(DbError::from)?;
    Ok(linked)
}

/// Seed the catalog: groups first, then users, all on one connection.
///
/// Returns an error only if the catalog is invalid or the group step fails.
#[instrument(skip_all, err)]
pub async fn run<I>(conn: &mut SqliteConnection, identity: &I, catalog: &SeedCatalog) -> Result<SeedReport, SeedError>
where
    I: IdentityStore + ?Sized,
{
    catalog.validate()?;

    info!("=== Creating Groups ===");
    let groups = ensure_groups(conn, &catalog.groups).await?;

    info!("=== Creating Users ===");
    let users = ensure_users(conn, identity, &catalog.users, &groups).await;

    let report = SeedReport {
        groups_created: groups.created,
        groups_existing: groups.existing,
        users,
    };
    info!("Seeding finished: {}", report.summary());

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password;
    use crate::db::handlers::{groups::GroupFilter, users::UserFilter};
    use crate::test_utils::{FailingIdentityStore, NotFoundAsErrorIdentityStore, create_test_user, test_user_manager};
    use sqlx::SqlitePool;
    use std::collections::HashSet;

    async fn all_groups(conn: &mut SqliteConnection) -> Vec<GroupDBResponse> {
        Groups::new(conn).list(&GroupFilter::new(0, 100)).await.unwrap()
    }

    async fn all_users(conn: &mut SqliteConnection) -> Vec<crate::db::models::users::UserDBResponse> {
        Users::new(conn).list(&UserFilter::new(0, 100)).await.unwrap()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_ensure_groups_into_empty_store(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let names = SeedCatalog::default().groups;

        let ensured = ensure_groups(&mut conn, &names).await.unwrap();
        assert_eq!(ensured.created, names);
        assert!(ensured.existing.is_empty());

        let groups = all_groups(&mut conn).await;
        assert_eq!(groups.len(), 3);
        let stored: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(stored, vec!["Admin", "Developer", "Guest"]);

        let ids: HashSet<i64> = groups.iter().map(|g| g.id).collect();
        assert_eq!(ids.len(), 3, "identifiers must be distinct");

        for group in &groups {
            assert_eq!(ensured.get(&group.name), Some(group));
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_ensure_groups_reuses_existing(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let admin = Groups::new(&mut conn).create(&GroupCreateDBRequest::new("Admin")).await.unwrap();

        let names = vec!["Admin".to_string(), "Guest".to_string()];
        let ensured = ensure_groups(&mut conn, &names).await.unwrap();

        assert_eq!(ensured.existing, vec!["Admin"]);
        assert_eq!(ensured.created, vec!["Guest"]);
        assert_eq!(ensured.get("Admin"), Some(&admin));
        assert_eq!(all_groups(&mut conn).await.len(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_ensure_groups_failure_rolls_back(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();

        // A trigger stands in for a store that rejects one of the inserts.
        sqlx::query(
            "CREATE TRIGGER reject_guest BEFORE INSERT ON user_groups WHEN NEW.name = 'Guest'
             BEGIN SELECT RAISE(ABORT, 'simulated rejection'); END",
        )
        .execute(&mut *conn)
        .await
        .unwrap();

        let names = SeedCatalog::default().groups;
        let err = ensure_groups(&mut conn, &names).await.unwrap_err();
        assert!(matches!(err, SeedError::Prerequisite(_)), "got {err:?}");

        // Admin and Developer were staged in the same transaction and must be gone too.
        assert!(all_groups(&mut conn).await.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_seed_users_linked_to_groups(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let manager = test_user_manager();
        let catalog = SeedCatalog::default();

        let report = run(&mut *conn, &manager, &catalog).await.unwrap();
        assert_eq!(report.groups_created.len(), 3);
        assert_eq!(report.users_created(), 6);
        assert_eq!(report.users_failed(), 0);

        let groups: HashMap<i64, String> = all_groups(&mut conn).await.into_iter().map(|g| (g.id, g.name)).collect();
        let users = all_users(&mut conn).await;
        assert_eq!(users.len(), 6);

        for spec in &catalog.users {
            let user = users.iter().find(|u| u.email == spec.email).expect("seeded user should exist");
            let group_name = user.group_id.and_then(|id| groups.get(&id)).map(String::as_str);
            assert_eq!(group_name, Some(spec.group.as_str()), "group of {}", spec.email);
            assert_eq!(user.is_superuser, spec.email == "admin@example.com");
            assert!(password::verify_string(&spec.password, &user.hashed_password).unwrap());
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_rerun_is_idempotent(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let manager = test_user_manager();
        let catalog = SeedCatalog::default();

        run(&mut *conn, &manager, &catalog).await.unwrap();
        let groups_before = all_groups(&mut conn).await;
        let users_before = all_users(&mut conn).await;

        let report = run(&mut *conn, &manager, &catalog).await.unwrap();
        assert!(report.groups_created.is_empty());
        assert_eq!(report.groups_existing, catalog.groups);
        assert_eq!(report.users_created(), 0);
        assert_eq!(report.users_skipped(), 6);
        assert!(report.users.iter().all(|u| u.outcome == UserOutcome::Skipped));

        let groups_after = all_groups(&mut conn).await;
        let users_after = all_users(&mut conn).await;
        assert_eq!(groups_before, groups_after);
        assert_eq!(users_before.len(), users_after.len());
        for (before, after) in users_before.iter().zip(&users_after) {
            assert_eq!(before.id, after.id);
            assert_eq!(before.hashed_password, after.hashed_password);
            assert_eq!(before.group_id, after.group_id);
            assert_eq!(before.is_superuser, after.is_superuser);
            assert_eq!(before.updated_at, after.updated_at);
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_existing_user_is_not_modified(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let manager = test_user_manager();

        // Pre-existing account with a different password and no group.
        let existing = manager.create(&mut conn, &UserCreate::new("dev1@example.com", "original")).await.unwrap();

        let report = run(&mut *conn, &manager, &SeedCatalog::default()).await.unwrap();
        assert_eq!(report.users_skipped(), 1);
        assert_eq!(report.users_created(), 5);

        let after = Users::new(&mut conn).get_by_id(existing.id).await.unwrap().unwrap();
        assert_eq!(after.group_id, None);
        assert_eq!(after.hashed_password, existing.hashed_password);
        assert!(password::verify_string("original", &after.hashed_password).unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_existing_user_matched_regardless_of_email_case(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let existing = create_test_user(&mut conn, "Admin@Example.com").await;

        let report = run(&mut *conn, &test_user_manager(), &SeedCatalog::default()).await.unwrap();
        assert_eq!(report.users[0].email, "admin@example.com");
        assert_eq!(report.users[0].outcome, UserOutcome::Skipped);
        assert_eq!(report.users_created(), 5);

        let users = all_users(&mut conn).await;
        let admins: Vec<_> = users.iter().filter(|u| u.email.eq_ignore_ascii_case("admin@example.com")).collect();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].id, existing.id);
        assert_eq!(admins[0].group_id, None);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unresolved_group_leaves_user_ungrouped(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let manager = test_user_manager();
        let catalog = SeedCatalog {
            groups: vec!["Admin".to_string()],
            users: vec![
                SeedUser::new("admin@example.com", "admin123", "Admin").superuser(),
                SeedUser::new("drifter@example.com", "drifter1", "Nowhere"),
            ],
        };

        let report = run(&mut *conn, &manager, &catalog).await.unwrap();
        assert_eq!(report.users[1].outcome, UserOutcome::Created { group: None });

        let drifter = manager.find_by_email(&mut conn, "drifter@example.com").await.unwrap().unwrap();
        assert_eq!(drifter.group_id, None);

        let admin = manager.find_by_email(&mut conn, "admin@example.com").await.unwrap().unwrap();
        assert!(admin.group_id.is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_partial_failure_isolated(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let identity = FailingIdentityStore::new(test_user_manager(), ["dev2@example.com"]);
        let catalog = SeedCatalog::default();

        let report = run(&mut *conn, &identity, &catalog).await.unwrap();
        assert_eq!(report.users_created(), 5);
        assert_eq!(report.users_failed(), 1);
        assert!(matches!(report.users[2].outcome, UserOutcome::Failed { .. }));
        assert_eq!(report.users[2].email, "dev2@example.com");

        // Everything after the failing record was still processed.
        for email in ["guest1@example.com", "guest2@example.com", "guest3@example.com"] {
            assert!(identity.find_by_email(&mut conn, email).await.unwrap().is_some(), "{email}");
        }
        assert!(identity.find_by_email(&mut conn, "dev2@example.com").await.unwrap().is_none());

        // A later run with a healthy store fills the gap.
        let report = run(&mut *conn, &test_user_manager(), &catalog).await.unwrap();
        assert_eq!(report.users_created(), 1);
        assert_eq!(report.users_skipped(), 5);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_failed_group_assignment_rolls_back_user(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let manager = test_user_manager();

        // A group that resolves by name but was never persisted: assignment hits the foreign key.
        let mut groups = EnsuredGroups::default();
        groups.by_name.insert(
            "Phantom".to_string(),
            GroupDBResponse {
                id: 9999,
                name: "Phantom".to_string(),
            },
        );
        let users = vec![
            SeedUser::new("ghost@example.com", "ghost123", "Phantom"),
            SeedUser::new("solid@example.com", "solid123", "None"),
        ];

        let reports = ensure_users(&mut conn, &manager, &users, &groups).await;
        assert!(matches!(reports[0].outcome, UserOutcome::Failed { .. }));
        assert_eq!(reports[1].outcome, UserOutcome::Created { group: None });

        assert!(manager.find_by_email(&mut conn, "ghost@example.com").await.unwrap().is_none());
        assert!(manager.find_by_email(&mut conn, "solid@example.com").await.unwrap().is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_not_found_error_treated_as_absence(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let identity = NotFoundAsErrorIdentityStore::new(test_user_manager());

        let report = run(&mut *conn, &identity, &SeedCatalog::default()).await.unwrap();
        assert_eq!(report.users_created(), 6);

        let report = run(&mut *conn, &identity, &SeedCatalog::default()).await.unwrap();
        assert_eq!(report.users_skipped(), 6);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_invalid_catalog_aborts_before_writing(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let catalog = SeedCatalog {
            groups: vec!["Admin".to_string(), "Admin".to_string()],
            users: vec![],
        };

        let err = run(&mut *conn, &test_user_manager(), &catalog).await.unwrap_err();
        assert!(matches!(err, SeedError::InvalidCatalog(_)));
        assert!(all_groups(&mut conn).await.is_empty());
    }

    #[test]
    fn test_report_summary() {
        let report = SeedReport {
            groups_created: vec!["Admin".to_string()],
            groups_existing: vec!["Guest".to_string(), "Developer".to_string()],
            users: vec![
                UserReport {
                    email: "a@example.com".to_string(),
                    outcome: UserOutcome::Created { group: None },
                },
                UserReport {
                    email: "b@example.com".to_string(),
                    outcome: UserOutcome::Skipped,
                },
                UserReport {
                    email: "c@example.com".to_string(),
                    outcome: UserOutcome::Failed {
                        reason: "boom".to_string(),
                    },
                },
            ],
        };

        assert_eq!(
            report.summary(),
            "groups: 1 created, 2 existing; users: 1 created, 1 existing, 1 failed"
        );
    }
}
