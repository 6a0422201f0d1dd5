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
use schema::products::dsl as Products;

/// Products repository, read only view of product prices
pub struct ProductsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<ProductPrice>>,
}

pub trait ProductsRepo {
    /// Price of product, used to value free product coupons
    fn find_price(&self, product_id_arg: ProductId) -> RepoResult<Option<ProductPrice>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ProductsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<ProductPrice>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ProductsRepo for ProductsRepoImpl<'a, T> {
    fn find_price(&self, product_id_arg: ProductId) -> RepoResult<Option<ProductPrice>> {
        debug!("Find price of product {}.", product_id_arg);
        let query = Products::products.filter(Products::id.eq(&product_id_arg));
        query
            .get_result::<ProductPrice>(self.db_conn)
            .optional()
            .map_err(from_diesel)
            .and_then(|value| {
                if let Some(value) = value.as_ref() {
                    acl::check(&*self.acl, Resource::Products, Action::Read, self, Some(value))?;
                };

                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find price of product {} error occurred", product_id_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, ProductPrice>
    for ProductsRepoImpl<'a, T>
{
    fn is_in_scope(&self, _user_id: UserId, scope: &Scope, _obj: Option<&ProductPrice>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => false,
        }
    }
}
