use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::models::{Drink, NewDrink};
use crate::database::repository::{DrinkStore, RepoError};

#[derive(Debug, Default)]
struct Table {
    last_id: i32,
    rows: BTreeMap<i32, Drink>,
}

impl Table {
    fn title_taken(&self, title: &str, except: Option<i32>) -> bool {
        self.rows
            .values()
            .any(|d| d.title == title && Some(d.id) != except)
    }
}

/// Volatile drink table with the same constraints as the Postgres one.
/// Ids are never reused, so listing by id is insertion order.
#[derive(Debug, Default)]
pub struct MemoryDrinkStore {
    table: RwLock<Table>,
}

impl MemoryDrinkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DrinkStore for MemoryDrinkStore {
    async fn list_all(&self) -> Result<Vec<Drink>, RepoError> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i32) -> Result<Drink, RepoError> {
        self.table
            .read()
            .await
            .rows
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound(id))
    }

    async fn create(&self, draft: NewDrink) -> Result<Drink, RepoError> {
        let mut table = self.table.write().await;
        if table.title_taken(&draft.title, None) {
            return Err(RepoError::DuplicateTitle(draft.title));
        }

        table.last_id += 1;
        let drink = Drink {
            id: table.last_id,
            title: draft.title,
            recipe: draft.recipe,
        };
        table.rows.insert(drink.id, drink.clone());
        Ok(drink)
    }

    async fn update_title(&self, id: i32, title: &str) -> Result<Drink, RepoError> {
        let mut table = self.table.write().await;
        if table.title_taken(title, Some(id)) {
            return Err(RepoError::DuplicateTitle(title.to_string()));
        }

        let drink = table.rows.get_mut(&id).ok_or(RepoError::NotFound(id))?;
        drink.title = title.to_string();
        Ok(drink.clone())
    }

    async fn delete_by_id(&self, id: i32) -> Result<i32, RepoError> {
        self.table
            .write()
            .await
            .rows
            .remove(&id)
            .map(|drink| drink.id)
            .ok_or(RepoError::NotFound(id))
    }

    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Ingredient;

    fn draft(title: &str) -> NewDrink {
        NewDrink {
            title: title.to_string(),
            recipe: vec![Ingredient {
                name: "espresso".to_string(),
                color: "brown".to_string(),
                parts: 2,
            }],
        }
    }

    #[tokio::test]
    async fn created_drink_round_trips() {
        let store = MemoryDrinkStore::new();
        let created = store.create(draft("Doppio")).await.unwrap();
        let fetched = store.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched.title, "Doppio");
        assert_eq!(fetched.recipe, created.recipe);
    }

    #[tokio::test]
    async fn titles_are_unique() {
        let store = MemoryDrinkStore::new();
        store.create(draft("Doppio")).await.unwrap();
        let second = store.create(draft("Cortado")).await.unwrap();

        assert!(matches!(store.create(draft("Doppio")).await, Err(RepoError::DuplicateTitle(_))));
        assert!(matches!(
            store.update_title(second.id, "Doppio").await,
            Err(RepoError::DuplicateTitle(_))
        ));
        // Renaming a drink to its own title is not a conflict
        assert_eq!(store.update_title(second.id, "Cortado").await.unwrap().title, "Cortado");
    }

    #[tokio::test]
    async fn list_is_in_insertion_order() {
        let store = MemoryDrinkStore::new();
        assert!(store.list_all().await.unwrap().is_empty());
        for title in ["Mocha", "Americano", "Latte"] {
            store.create(draft(title)).await.unwrap();
        }
        let titles: Vec<String> = store.list_all().await.unwrap().into_iter().map(|d| d.title).collect();
        assert_eq!(titles, vec!["Mocha", "Americano", "Latte"]);
    }

    #[tokio::test]
    async fn delete_twice_reports_not_found() {
        let store = MemoryDrinkStore::new();
        let drink = store.create(draft("Ristretto")).await.unwrap();
        assert_eq!(store.delete_by_id(drink.id).await.unwrap(), drink.id);
        assert!(matches!(store.delete_by_id(drink.id).await, Err(RepoError::NotFound(id)) if id == drink.id));
        assert!(matches!(store.get_by_id(drink.id).await, Err(RepoError::NotFound(_))));
    }

    #[tokio::test]
    async fn ids_are_not_reused() {
        let store = MemoryDrinkStore::new();
        let first = store.create(draft("Lungo")).await.unwrap();
        store.delete_by_id(first.id).await.unwrap();
        let second = store.create(draft("Lungo")).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = MemoryDrinkStore::new();
        assert!(matches!(store.update_title(999, "X").await, Err(RepoError::NotFound(999))));
    }
}
