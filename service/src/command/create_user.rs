//! [`Command`] for creating a new [`User`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Name, Password, Role};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for registering a new [`User`].
///
/// The very first registered [`User`] becomes a [`Role::SuperAdmin`], while
/// all the following ones are regular [`Role::User`]s.
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// [`Email`] of a new [`User`].
    pub email: user::Email,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,

    /// [`Name`] of a new [`User`], if any.
    pub name: Option<user::Name>,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: for<'l> Database<
            Select<By<Option<User>, &'l user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<read::user::TotalCount, ()>>,
            Ok = read::user::TotalCount,
            Err = Traced<database::Error>,
        > + Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            email,
            password,
            name,
        } = cmd;

        let existing = self
            .database()
            .execute(Select(By::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::EmailOccupied(email)));
        }

        let password_hash = user::PasswordHash::new(password.expose_secret())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let registered: u64 = tx
            .execute(Select(By::new(())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into();
        let role = if registered == 0 {
            user::Role::SuperAdmin
        } else {
            user::Role::User
        };

        let user = User {
            id: user::Id::new(),
            email,
            name,
            password_hash,
            role,
            avatar_url: None,
            phone: None,
            bio: None,
            created_at: DateTime::now().coerce(),
        };

        // Concurrent registration with the same email is caught by the
        // uniqueness of the stored emails, either on insert or on commit.
        let inserted = tx.execute(Insert(user.clone())).await.map(drop);
        let committed = match inserted {
            Ok(()) => tx.execute(Commit).await.map(drop),
            Err(e) => Err(e),
        };
        if committed.as_ref().is_err_and(|e| e.as_ref().is_conflict()) {
            return Err(tracerr::new!(E::EmailOccupied(user.email)));
        }
        committed.map_err(tracerr::map_from_and_wrap!(=> E))?;

        tracing::info!(user.id = %user.id, user.role = %user.role, "registered");

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`user::Email`] is already occupied.
    #[display("`{_0}` email is occupied")]
    EmailOccupied(#[error(not(source))] user::Email),

    /// Failed to hash the [`user::Password`].
    #[display("Failed to hash `Password`: {_0}")]
    #[from]
    PasswordHashing(#[error(not(source))] argon2::password_hash::Error),
}
