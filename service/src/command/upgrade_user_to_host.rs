//! [`Command`] for upgrading a [`User`] to a host.

use common::operations::{By, Commit, Lock, Select, Transact, Transacted, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for upgrading a regular [`User`] to a [`user::Role::Host`],
/// allowing it to publish listings.
///
/// Only a [`user::Role::User`] can be upgraded, any other [`user::Role`] is
/// already elevated.
#[derive(Clone, Copy, Debug, From)]
pub struct UpgradeUserToHost {
    /// ID of the [`User`] to upgrade.
    pub user_id: user::Id,
}

impl<Db> Command<UpgradeUserToHost> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<User, user::Id>>, Err = Traced<database::Error>>
        + Database<Update<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpgradeUserToHost,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpgradeUserToHost { user_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Lock(By::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut user = tx
            .execute(Select(By::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;
        if user.role != user::Role::User {
            return Err(tracerr::new!(E::AlreadyElevated(user.role)));
        }
        user.role = user::Role::Host;

        tx.execute(Update(user.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::info!(user.id = %user.id, "upgraded to host");

        Ok(user)
    }
}

/// Error of [`UpgradeUserToHost`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`User`] already has an elevated [`user::Role`].
    #[display("`User` is already elevated to `{_0}`")]
    AlreadyElevated(#[error(not(source))] user::Role),
}
