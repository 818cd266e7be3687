//! Credential store trait and its PostgreSQL implementation.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, SqlErr, Statement,
};

use super::entities::credential::{self, ActiveModel, Entity as CredentialEntity};
use common::{AppError, AppResult};
use domain::Credential;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Durable record of account credentials.
///
/// Email uniqueness is enforced by the store: `create_and_save` must fail
/// with `EmailInUse` if another credential with the same email exists, even
/// when two inserts race.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a credential by exact email
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Credential>>;

    /// Persist a new credential
    async fn create_and_save(&self, email: String, password_hash: String) -> AppResult<Credential>;

    /// Check the store is reachable
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

/// PostgreSQL-backed credential store
pub struct PgCredentialStore {
    db: DatabaseConnection,
}

impl PgCredentialStore {
    /// Create new store instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn map_insert_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::EmailInUse,
        _ => AppError::from(err),
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Credential>> {
        let result = CredentialEntity::find()
            .filter(credential::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Credential::from))
    }

    async fn create_and_save(&self, email: String, password_hash: String) -> AppResult<Credential> {
        let new = Credential::new(email, password_hash);
        let active_model = ActiveModel {
            id: Set(new.id),
            email: Set(new.email),
            password_hash: Set(new.password_hash),
            created_at: Set(new.created_at),
        };

        let model = active_model.insert(&self.db).await.map_err(map_insert_error)?;
        Ok(Credential::from(model))
    }

    async fn ping(&self) -> AppResult<()> {
        self.db
            .execute(Statement::from_string(
                self.db.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await?;
        Ok(())
    }
}
