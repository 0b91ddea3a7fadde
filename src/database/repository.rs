use async_trait::async_trait;
use thiserror::Error;

use crate::database::models::{Drink, NewDrink};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("drink {0} not found")]
    NotFound(i32),

    #[error("a drink titled '{0}' already exists")]
    DuplicateTitle(String),

    #[error("recipe could not be (de)serialized: {0}")]
    Recipe(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Storage for menu items.
///
/// Every operation is a single independent storage step; `update_title`
/// is not guarded against concurrent writers to the same id.
#[async_trait]
pub trait DrinkStore: Send + Sync {
    /// All drinks in insertion order.
    async fn list_all(&self) -> Result<Vec<Drink>, RepoError>;

    async fn get_by_id(&self, id: i32) -> Result<Drink, RepoError>;

    async fn create(&self, draft: NewDrink) -> Result<Drink, RepoError>;

    async fn update_title(&self, id: i32, title: &str) -> Result<Drink, RepoError>;

    /// Permanently removes the drink and returns its id.
    async fn delete_by_id(&self, id: i32) -> Result<i32, RepoError>;

    /// Cheap connectivity probe for health checks.
    async fn ping(&self) -> Result<(), RepoError>;
}
