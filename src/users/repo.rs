use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use crate::users::repo_types::{User, UserDraft};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email is already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Persistence(#[from] sqlx::Error),
}

impl User {
    /// Find a user by id.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, category, date_of_birth, bio, avatar
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, category, date_of_birth, bio, avatar
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user. The id is generated here, never by the caller.
    pub async fn create(db: &PgPool, draft: UserDraft) -> Result<User, StoreError> {
        let id = Uuid::new_v4();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, name, category, date_of_birth, bio, avatar)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, email, password_hash, name, category, date_of_birth, bio, avatar
            "#,
        )
        .bind(id)
        .bind(&draft.email)
        .bind(&draft.password_hash)
        .bind(&draft.name)
        .bind(draft.category)
        .bind(draft.date_of_birth)
        .bind(&draft.bio)
        .bind(&draft.avatar)
        .fetch_one(db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::DuplicateEmail
            }
            other => StoreError::Persistence(other),
        })?;
        Ok(user)
    }

    /// Partial update: email, password hash and avatar stay untouched.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        name: &str,
        category: i32,
        date_of_birth: Date,
        bio: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET name = $1, category = $2, date_of_birth = $3, bio = $4
            WHERE id = $5
            "#,
        )
        .bind(name)
        .bind(category)
        .bind(date_of_birth)
        .bind(bio)
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Set only the avatar reference.
    pub async fn update_avatar(db: &PgPool, id: Uuid, avatar: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET avatar = $1
            WHERE id = $2
            "#,
        )
        .bind(avatar)
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// All users, materialized in full; a scan error aborts the whole read.
    pub async fn list_all(db: &PgPool) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, category, date_of_birth, bio, avatar
            FROM users
            ORDER BY name
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
