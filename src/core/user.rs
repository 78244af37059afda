//! User administration - Creating, listing, resetting and removing accounts.
//!
//! Only administrators reach these operations through the web layer; the functions
//! themselves enforce the invariants that must hold regardless of caller: unique
//! usernames, at least one administrator, and no orphaned bookkeeping records.

use crate::{
    core::auth,
    entities::{DailyRegister, LedgerEntry, Role, User, daily_register, ledger_entry, user},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Result of a password reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The administrator supplied the new password
    Custom,
    /// A temporary password was generated and must be shown to the administrator
    Generated(String),
}

/// Finds a user by id.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds a user by exact username.
pub async fn get_user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All users, by role name descending (`user`, `caixa`, `admin`), then username.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_desc(user::Column::Role)
        .order_by_asc(user::Column::Username)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a new account after validating the input.
///
/// Username and password are trimmed and must not be empty; the username must not
/// be taken yet.
pub async fn create_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    role: Role,
) -> Result<user::Model> {
    let username = username.trim();
    let password = password.trim();
    if username.is_empty() || password.is_empty() {
        return Err(Error::validation("Preencha usuário e senha."));
    }

    if get_user_by_username(db, username).await?.is_some() {
        return Err(Error::Conflict {
            message: format!("Já existe um usuário com o nome '{username}'."),
        });
    }

    let account = user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set(auth::hash_password(password)?),
        role: Set(role),
        ..Default::default()
    };
    let account = account.insert(db).await?;
    info!(user_id = account.id, username = %account.username, role = account.role.as_str(), "User created");
    Ok(account)
}

/// Sets a new password, generating a temporary one when `new_password` is blank.
pub async fn reset_password(
    db: &DatabaseConnection,
    user_id: i64,
    new_password: Option<&str>,
) -> Result<ResetOutcome> {
    let account = get_user_by_id(db, user_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "User",
            id: user_id,
        })?;

    let (password, outcome) = match new_password.map(str::trim).filter(|p| !p.is_empty()) {
        Some(password) => (password.to_string(), ResetOutcome::Custom),
        None => {
            let generated = auth::generate_temporary_password();
            (generated.clone(), ResetOutcome::Generated(generated))
        }
    };

    let mut active: user::ActiveModel = account.into();
    active.password_hash = Set(auth::hash_password(&password)?);
    active.update(db).await?;
    info!(user_id, "Password reset");
    Ok(outcome)
}

/// Removes an account.
///
/// Refuses to remove the acting administrator, the last administrator, and users
/// that still own registers or ledger entries.
pub async fn delete_user(db: &DatabaseConnection, actor_id: i64, user_id: i64) -> Result<()> {
    if actor_id == user_id {
        return Err(Error::forbidden("Você não pode remover a si mesmo."));
    }

    let txn = db.begin().await?;

    let account = User::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "User",
            id: user_id,
        })?;

    if account.is_admin() {
        let admins = User::find()
            .filter(user::Column::Role.eq(Role::Admin))
            .count(&txn)
            .await?;
        if admins <= 1 {
            return Err(Error::forbidden(
                "Não é possível remover o único administrador.",
            ));
        }
    }

    let registers = DailyRegister::find()
        .filter(daily_register::Column::UserId.eq(user_id))
        .count(&txn)
        .await?;
    let entries = LedgerEntry::find()
        .filter(ledger_entry::Column::UserId.eq(user_id))
        .count(&txn)
        .await?;
    if registers + entries > 0 {
        return Err(Error::Conflict {
            message: format!(
                "O usuário '{}' possui {registers} caixa(s) e {entries} lançamento(s) e não pode ser removido.",
                account.username
            ),
        });
    }

    account.delete(&txn).await?;
    txn.commit().await?;
    info!(user_id, actor_id, "User deleted");
    Ok(())
}

/// Makes sure the bootstrap administrator exists.
///
/// Returns `true` when the account had to be created.
pub async fn ensure_admin(db: &DatabaseConnection, username: &str, password: &str) -> Result<bool> {
    if get_user_by_username(db, username).await?.is_some() {
        return Ok(false);
    }
    create_user(db, username, password, Role::Admin).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_user_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_user(&db, "  ", "secret", Role::User).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_user(&db, "ana", "   ", Role::User).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_duplicate() -> Result<()> {
        let db = setup_test_db().await?;
        create_user(&db, "ana", "secret", Role::User).await?;

        let result = create_user(&db, " ana ", "other", Role::Caixa).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_users_by_role_descending_then_username() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "bruno", Role::User).await?;
        create_test_user(&db, "zeca", Role::Admin).await?;
        create_test_user(&db, "ana", Role::Caixa).await?;
        create_test_user(&db, "admin", Role::Admin).await?;
        create_test_user(&db, "beto", Role::User).await?;

        let listed: Vec<(&'static str, String)> = list_users(&db)
            .await?
            .into_iter()
            .map(|u| (u.role.as_str(), u.username))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("user", "beto".to_string()),
                ("user", "bruno".to_string()),
                ("caixa", "ana".to_string()),
                ("admin", "admin".to_string()),
                ("admin", "zeca".to_string()),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_password_custom_and_generated() -> Result<()> {
        let db = setup_test_db().await?;
        let account = create_test_user(&db, "ana", Role::User).await?;

        let outcome = reset_password(&db, account.id, Some("nova-senha")).await?;
        assert_eq!(outcome, ResetOutcome::Custom);
        auth::authenticate(&db, "ana", "nova-senha").await?;

        let outcome = reset_password(&db, account.id, Some("   ")).await?;
        let ResetOutcome::Generated(temporary) = outcome else {
            panic!("expected a generated password");
        };
        auth::authenticate(&db, "ana", &temporary).await?;

        let missing = reset_password(&db, 999, None).await;
        assert!(matches!(missing, Err(Error::NotFound { id: 999, .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_user_safeguards() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_user(&db, "admin", Role::Admin).await?;
        let clerk = create_test_user(&db, "ana", Role::Caixa).await?;

        // Cannot remove yourself
        let result = delete_user(&db, admin.id, admin.id).await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));

        // Cannot remove the only admin, even from another account
        let result = delete_user(&db, clerk.id, admin.id).await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));

        delete_user(&db, admin.id, clerk.id).await?;
        assert!(get_user_by_id(&db, clerk.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_user_with_records_is_refused() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_user(&db, "admin", Role::Admin).await?;
        let clerk = create_test_user(&db, "ana", Role::Caixa).await?;
        create_test_register(&db, clerk.id, test_date(2024, 3, 1)).await?;

        let result = delete_user(&db, admin.id, clerk.id).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));
        assert!(get_user_by_id(&db, clerk.id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(ensure_admin(&db, "admin", "admin123").await?);
        assert!(!ensure_admin(&db, "admin", "other").await?);

        let admin = get_user_by_username(&db, "admin").await?.unwrap();
        assert!(admin.is_admin());
        auth::authenticate(&db, "admin", "admin123").await?;
        Ok(())
    }
}
