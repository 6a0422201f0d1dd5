use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use errors::from_diesel;
use models::*;
use repos::acl;
use repos::legacy_acl::CheckScope;
use repos::types::{RepoAcl, RepoResult};
use schema::users::dsl as Users;

/// Points ledger, responsible for the points column of users table
pub struct UserPointsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<UserPoints>>,
}

pub trait UserPointsRepo {
    /// Get points balance of user
    fn get(&self, user_id_arg: UserId) -> RepoResult<Option<UserPoints>>;

    /// Takes `cost` off the balance in a single guarded update.
    /// Returns None when the balance is lower than `cost`, leaving it untouched.
    fn deduct(&self, user_id_arg: UserId, cost: Points) -> RepoResult<Option<UserPoints>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> UserPointsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<UserPoints>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> UserPointsRepo for UserPointsRepoImpl<'a, T> {
    fn get(&self, user_id_arg: UserId) -> RepoResult<Option<UserPoints>> {
        debug!("Find points of user {}.", user_id_arg);
        let query = Users::users.filter(Users::id.eq(&user_id_arg));
        query
            .get_result::<UserPoints>(self.db_conn)
            .optional()
            .map_err(from_diesel)
            .and_then(|value| {
                if let Some(value) = value.as_ref() {
                    acl::check(&*self.acl, Resource::UserPoints, Action::Read, self, Some(value))?;
                };

                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find points of user {} error occurred", user_id_arg)).into())
    }

    fn deduct(&self, user_id_arg: UserId, cost: Points) -> RepoResult<Option<UserPoints>> {
        debug!("Deduct {} points from user {}.", cost, user_id_arg);

        self.get(user_id_arg)
            .and_then(|value| match value {
                Some(value) => acl::check(&*self.acl, Resource::UserPoints, Action::Update, self, Some(&value)),
                None => Ok(()),
            }).and_then(|_| {
                let filtered = Users::users.filter(Users::id.eq(&user_id_arg)).filter(Users::points.ge(cost));
                let query = diesel::update(filtered).set(Users::points.eq(Users::points - cost));

                query.get_result::<UserPoints>(self.db_conn).optional().map_err(from_diesel)
            }).map_err(|e: FailureError| {
                e.context(format!("Deduct {} points from user {} error occurred", cost, user_id_arg))
                    .into()
            })
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, UserPoints>
    for UserPointsRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&UserPoints>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => {
                if let Some(value) = obj {
                    value.user_id == user_id
                } else {
                    false
                }
            }
        }
    }
}
