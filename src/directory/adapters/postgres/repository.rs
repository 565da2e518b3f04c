//! `PostgreSQL` directory implementation.

use super::{
    models::{RoleRow, UserRoleRow, UserRow},
    schema::{roles, user_roles, users},
};
use crate::directory::{
    domain::{PersistedUserData, Role, RoleId, Timezone, User, UserId, WorkHours},
    ports::{DirectoryError, DirectoryResult, UserDirectory, directory::sort_users},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::{BTreeSet, HashMap};

/// `PostgreSQL` connection pool type used by the directory adapter.
pub type DirectoryPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed user directory.
#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    pool: DirectoryPgPool,
}

impl PostgresUserDirectory {
    /// Creates a directory from a connection pool.
    #[must_use]
    pub const fn new(pool: DirectoryPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> DirectoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> DirectoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(DirectoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(DirectoryError::persistence)?
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_user(&self, id: &UserId) -> DirectoryResult<Option<User>> {
        let lookup = id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = users::table
                .find(lookup.as_str())
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()
                .map_err(DirectoryError::persistence)?;
            let Some(user_row) = row else {
                return Ok(None);
            };
            let mut memberships = load_memberships(connection, &[lookup])?;
            let roles = memberships.remove(&user_row.id).unwrap_or_default();
            row_to_user(user_row, roles).map(Some)
        })
        .await
    }

    async fn store_user(&self, user: &User) -> DirectoryResult<()> {
        let row = to_row(user);
        let user_id = user.id().clone();
        let memberships: Vec<UserRoleRow> = user
            .roles()
            .iter()
            .map(|role| UserRoleRow {
                user_id: user_id.as_str().to_owned(),
                role_id: role.value(),
            })
            .collect();
        self.run_blocking(move |connection| {
            connection.transaction::<_, DirectoryError, _>(|tx| {
                diesel::insert_into(users::table)
                    .values(&row)
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            DirectoryError::DuplicateUser(user_id.clone())
                        }
                        _ => DirectoryError::persistence(err),
                    })?;
                if !memberships.is_empty() {
                    diesel::insert_into(user_roles::table)
                        .values(&memberships)
                        .on_conflict_do_nothing()
                        .execute(tx)
                        .map_err(DirectoryError::persistence)?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn update_user(&self, user: &User) -> DirectoryResult<()> {
        let row = to_row(user);
        let user_id = user.id().clone();
        self.run_blocking(move |connection| {
            let updated = diesel::update(users::table.find(user_id.as_str()))
                .set(&row)
                .execute(connection)
                .map_err(DirectoryError::persistence)?;
            if updated == 0 {
                return Err(DirectoryError::UserNotFound(user_id));
            }
            Ok(())
        })
        .await
    }

    async fn list_users(&self) -> DirectoryResult<Vec<User>> {
        self.run_blocking(|connection| {
            let rows = users::table
                .select(UserRow::as_select())
                .load::<UserRow>(connection)
                .map_err(DirectoryError::persistence)?;
            rows_to_users(connection, rows)
        })
        .await
    }

    async fn store_role(&self, role: &Role) -> DirectoryResult<()> {
        let row = RoleRow {
            id: role.id().value(),
            name: role.name().to_owned(),
            description: role.description().to_owned(),
        };
        self.run_blocking(move |connection| {
            diesel::insert_into(roles::table)
                .values(&row)
                .on_conflict(roles::id)
                .do_update()
                .set(&row)
                .execute(connection)
                .map_err(DirectoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn find_role(&self, id: RoleId) -> DirectoryResult<Option<Role>> {
        self.run_blocking(move |connection| {
            let row = roles::table
                .find(id.value())
                .select(RoleRow::as_select())
                .first::<RoleRow>(connection)
                .optional()
                .map_err(DirectoryError::persistence)?;
            row.map(row_to_role).transpose()
        })
        .await
    }

    async fn list_roles(&self) -> DirectoryResult<Vec<Role>> {
        self.run_blocking(|connection| {
            let rows = roles::table
                .order(roles::name.asc())
                .select(RoleRow::as_select())
                .load::<RoleRow>(connection)
                .map_err(DirectoryError::persistence)?;
            rows.into_iter().map(row_to_role).collect()
        })
        .await
    }

    async fn assign_role(&self, user: &UserId, role: RoleId) -> DirectoryResult<()> {
        let user_id = user.clone();
        self.run_blocking(move |connection| {
            connection.transaction::<_, DirectoryError, _>(|tx| {
                ensure_role_exists(tx, role)?;
                let user_exists = diesel::select(diesel::dsl::exists(
                    users::table.find(user_id.as_str()),
                ))
                .get_result::<bool>(tx)
                .map_err(DirectoryError::persistence)?;
                if !user_exists {
                    return Err(DirectoryError::UserNotFound(user_id.clone()));
                }
                diesel::insert_into(user_roles::table)
                    .values(&UserRoleRow {
                        user_id: user_id.as_str().to_owned(),
                        role_id: role.value(),
                    })
                    .on_conflict_do_nothing()
                    .execute(tx)
                    .map_err(DirectoryError::persistence)?;
                Ok(())
            })
        })
        .await
    }

    async fn role_members(&self, role: RoleId) -> DirectoryResult<Vec<User>> {
        self.run_blocking(move |connection| {
            ensure_role_exists(connection, role)?;
            let rows = users::table
                .inner_join(user_roles::table)
                .filter(user_roles::role_id.eq(role.value()))
                .select(UserRow::as_select())
                .load::<UserRow>(connection)
                .map_err(DirectoryError::persistence)?;
            rows_to_users(connection, rows)
        })
        .await
    }
}

impl From<DieselError> for DirectoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

fn ensure_role_exists(connection: &mut PgConnection, role: RoleId) -> DirectoryResult<()> {
    let exists = diesel::select(diesel::dsl::exists(roles::table.find(role.value())))
        .get_result::<bool>(connection)
        .map_err(DirectoryError::persistence)?;
    if exists {
        Ok(())
    } else {
        Err(DirectoryError::RoleNotFound(role))
    }
}

fn load_memberships(
    connection: &mut PgConnection,
    user_ids: &[String],
) -> DirectoryResult<HashMap<String, BTreeSet<RoleId>>> {
    let rows = user_roles::table
        .filter(user_roles::user_id.eq_any(user_ids))
        .select(UserRoleRow::as_select())
        .load::<UserRoleRow>(connection)
        .map_err(DirectoryError::persistence)?;
    let mut memberships: HashMap<String, BTreeSet<RoleId>> = HashMap::new();
    for row in rows {
        let role = RoleId::new(row.role_id).map_err(DirectoryError::persistence)?;
        memberships.entry(row.user_id).or_default().insert(role);
    }
    Ok(memberships)
}

fn rows_to_users(connection: &mut PgConnection, rows: Vec<UserRow>) -> DirectoryResult<Vec<User>> {
    let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
    let mut memberships = load_memberships(connection, &ids)?;
    let mut users = rows
        .into_iter()
        .map(|row| {
            let roles = memberships.remove(&row.id).unwrap_or_default();
            row_to_user(row, roles)
        })
        .collect::<DirectoryResult<Vec<User>>>()?;
    sort_users(&mut users);
    Ok(users)
}

fn to_row(user: &User) -> UserRow {
    UserRow {
        id: user.id().as_str().to_owned(),
        username: user.username().map(str::to_owned),
        first_name: user.first_name().map(str::to_owned),
        last_name: user.last_name().map(str::to_owned),
        is_admin: user.is_admin(),
        timezone: user.timezone().name().to_owned(),
        work_start: i16::from(user.work_hours().start()),
        work_end: i16::from(user.work_hours().end()),
        last_summary_sent_on: user.last_summary_sent_on(),
        tutorial_finished: user.tutorial_finished(),
        created_at: user.created_at(),
    }
}

fn row_to_user(row: UserRow, roles: BTreeSet<RoleId>) -> DirectoryResult<User> {
    let work_start = u8::try_from(row.work_start).map_err(DirectoryError::persistence)?;
    let work_end = u8::try_from(row.work_end).map_err(DirectoryError::persistence)?;
    Ok(User::from_persisted(PersistedUserData {
        id: UserId::new(row.id).map_err(DirectoryError::persistence)?,
        username: row.username,
        first_name: row.first_name,
        last_name: row.last_name,
        is_admin: row.is_admin,
        timezone: Timezone::parse(&row.timezone).map_err(DirectoryError::persistence)?,
        work_hours: WorkHours::new(work_start, work_end).map_err(DirectoryError::persistence)?,
        roles,
        last_summary_sent_on: row.last_summary_sent_on,
        tutorial_finished: row.tutorial_finished,
        created_at: row.created_at,
    }))
}

fn row_to_role(row: RoleRow) -> DirectoryResult<Role> {
    let id = RoleId::new(row.id).map_err(DirectoryError::persistence)?;
    Role::new(id, row.name, row.description).map_err(DirectoryError::persistence)
}
