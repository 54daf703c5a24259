use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::UserRepository;
use crate::domain::user::{NewUser, User, UserPatch};
use crate::schema::users;

use super::models::{UserChangeset, UserRow};

pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl UserRepository for DieselUserRepository {
    fn list(&self) -> Result<Vec<User>, DomainError> {
        let mut conn = self.pool.get()?;

        users::table
            .order(users::full_name.asc())
            .select(UserRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let mut conn = self.pool.get()?;

        users::table
            .find(id)
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(User::try_from)
            .transpose()
    }

    fn create(&self, user: &NewUser) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;

        let id = Uuid::new_v4();
        diesel::insert_into(users::table)
            .values((
                users::id.eq(id),
                users::email.eq(&user.email),
                users::full_name.eq(&user.full_name),
                users::role.eq(user.role.as_str()),
            ))
            .execute(&mut conn)?;
        Ok(id)
    }

    fn update(&self, id: Uuid, patch: &UserPatch) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(users::table.find(id))
            .set(&UserChangeset {
                full_name: patch.full_name.clone(),
                role: patch.role.map(|r| r.as_str().to_string()),
                active: patch.active,
                updated_at: Utc::now(),
            })
            .execute(&mut conn)?;
        Ok(updated > 0)
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(users::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }
}
