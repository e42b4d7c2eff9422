use crate::change_tracker::{ChangeTracker, PendingChange};
use crate::database::{users, Database};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use domain::{DomainError, Repository, User, UserRepository};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

// Database model - separate from domain entity
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub(crate) struct UserModel {
    user_id: String,
    name: String,
    email: String,
    created_at: NaiveDateTime,
}

// Convert between domain and database models
impl TryFrom<UserModel> for User {
    type Error = DomainError;

    fn try_from(model: UserModel) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&model.user_id).map_err(|e| {
            DomainError::RepositoryError(format!("Corrupt user id '{}': {e}", model.user_id))
        })?;

        Ok(User::with_id(
            user_id,
            model.name,
            model.email,
            model.created_at.and_utc(),
        ))
    }
}

impl From<&User> for UserModel {
    fn from(user: &User) -> Self {
        UserModel {
            user_id: user.user_id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at().naive_utc(),
        }
    }
}

/// Writes one staged change; used inside the unit of work's transaction.
///
/// Updating or deleting a row that no longer exists fails with
/// `NotFound`, which rolls the whole transaction back.
pub(crate) fn apply_change(
    conn: &mut SqliteConnection,
    change: &PendingChange<User>,
) -> QueryResult<usize> {
    let affected = match change {
        PendingChange::Added(user) => diesel::insert_into(users::table)
            .values(UserModel::from(user))
            .execute(conn)?,
        PendingChange::Modified(user) => {
            diesel::update(users::table.filter(users::user_id.eq(user.user_id.to_string())))
                .set((users::name.eq(&user.name), users::email.eq(&user.email)))
                .execute(conn)?
        }
        PendingChange::Deleted(user) => {
            diesel::delete(users::table.filter(users::user_id.eq(user.user_id.to_string())))
                .execute(conn)?
        }
    };

    if affected == 0 {
        return Err(diesel::result::Error::NotFound);
    }
    Ok(affected)
}

/// SQLite-backed user repository. Reads hit the database directly; writes are
/// staged in the scope's change tracker.
#[derive(Clone)]
pub struct SqliteUserRepository {
    db: Database,
    tracker: Arc<ChangeTracker<User>>,
}

impl SqliteUserRepository {
    pub fn new(db: Database, tracker: Arc<ChangeTracker<User>>) -> Self {
        Self { db, tracker }
    }

    pub(crate) fn take_pending(&self) -> Vec<PendingChange<User>> {
        self.tracker.drain()
    }
}

fn into_users(models: Vec<UserModel>) -> Result<Vec<User>, DomainError> {
    models.into_iter().map(User::try_from).collect()
}

#[async_trait]
impl Repository<User> for SqliteUserRepository {
    async fn get_all(&self, cancel: &CancellationToken) -> Result<Vec<User>, DomainError> {
        let models = self
            .db
            .run("users.get_all", cancel, |conn, _| {
                users::table
                    .order(users::created_at.asc())
                    .select(UserModel::as_select())
                    .load::<UserModel>(conn)
            })
            .await?;

        debug!(count = models.len(), "Loaded users");
        into_users(models)
    }

    async fn get_by_id(&self, id: Uuid, cancel: &CancellationToken) -> Result<Option<User>, DomainError> {
        let key = id.to_string();
        let model = self
            .db
            .run("users.get_by_id", cancel, move |conn, _| {
                users::table
                    .filter(users::user_id.eq(&key))
                    .select(UserModel::as_select())
                    .first::<UserModel>(conn)
                    .optional()
            })
            .await?;

        model.map(User::try_from).transpose()
    }

    async fn add(&self, entity: User, _cancel: &CancellationToken) -> Result<(), DomainError> {
        self.tracker.track(PendingChange::Added(entity));
        Ok(())
    }

    fn update(&self, entity: User) {
        self.tracker.track(PendingChange::Modified(entity));
    }

    fn delete(&self, entity: User) {
        self.tracker.track(PendingChange::Deleted(entity));
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn get_by_email(&self, email: &str, cancel: &CancellationToken) -> Result<Option<User>, DomainError> {
        debug!(email = %self.db.redact(email), "Looking up user by email");

        let email = email.to_string();
        let model = self
            .db
            .run("users.get_by_email", cancel, move |conn, _| {
                users::table
                    .filter(users::email.eq(&email))
                    .select(UserModel::as_select())
                    .first::<UserModel>(conn)
                    .optional()
            })
            .await?;

        model.map(User::try_from).transpose()
    }
}
