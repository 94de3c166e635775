//! Business logic services

pub mod catalog;
pub mod codes;
pub mod email;
pub mod loans;
pub mod members;
pub mod queue;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    repository::{BookStore, LoanLedger, MemberStore, Repository},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub members: members::MembersService,
    pub loans: loans::LoansService,
}

impl Services {
    /// Create all services backed by the PostgreSQL repository
    pub fn new(
        repository: Repository,
        dispatcher: Arc<dyn queue::EmailDispatcher>,
        config: &AppConfig,
    ) -> Self {
        Self::with_stores(
            Arc::new(repository.books),
            Arc::new(repository.members),
            Arc::new(repository.loans),
            dispatcher,
            config,
        )
    }

    /// Create all services over arbitrary storage backends
    pub fn with_stores(
        books: Arc<dyn BookStore>,
        members: Arc<dyn MemberStore>,
        ledger: Arc<dyn LoanLedger>,
        dispatcher: Arc<dyn queue::EmailDispatcher>,
        config: &AppConfig,
    ) -> Self {
        Self {
            catalog: catalog::CatalogService::new(books.clone()),
            members: members::MembersService::new(
                members.clone(),
                dispatcher,
                config.auth.clone(),
            ),
            loans: loans::LoansService::new(members, books, ledger, config.loans.clone()),
        }
    }
}
