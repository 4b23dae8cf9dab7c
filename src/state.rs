use crate::config::Config;
use crate::error::AppResult;
use crate::models::Transaction;
use crate::store::TransactionRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn TransactionRepository>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(repo: Arc<dyn TransactionRepository>, config: Config) -> Self {
        Self {
            repo,
            config: Arc::new(config),
        }
    }

    /// Current transaction snapshot from the store.
    pub fn load_transactions(&self) -> AppResult<Vec<Transaction>> {
        self.repo.list()
    }
}
