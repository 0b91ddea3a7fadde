use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::database::models::{Drink, Ingredient, NewDrink};
use crate::database::repository::{DrinkStore, RepoError};

const SELECT_DRINKS: &str = "SELECT id, title, recipe FROM drinks";

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS drinks (
        id SERIAL PRIMARY KEY,
        title TEXT NOT NULL UNIQUE,
        recipe TEXT NOT NULL
    )
"#;

/// Stored row; the recipe column holds the serialized ingredient list.
#[derive(Debug, FromRow)]
struct DrinkRow {
    id: i32,
    title: String,
    recipe: String,
}

impl TryFrom<DrinkRow> for Drink {
    type Error = RepoError;

    fn try_from(row: DrinkRow) -> Result<Self, Self::Error> {
        Ok(Drink {
            id: row.id,
            title: row.title,
            recipe: serde_json::from_str(&row.recipe)?,
        })
    }
}

/// Postgres-backed drink table.
#[derive(Clone)]
pub struct PgDrinkStore {
    pool: PgPool,
}

impl PgDrinkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the drinks table when it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), RepoError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Drop and recreate the table, then seed a single drink.
    pub async fn reset(&self) -> Result<Drink, RepoError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DROP TABLE IF EXISTS drinks").execute(&mut *tx).await?;
        sqlx::query(CREATE_TABLE).execute(&mut *tx).await?;
        tx.commit().await?;

        let seeded = self
            .create(NewDrink {
                title: "water".to_string(),
                recipe: vec![Ingredient {
                    name: "water".to_string(),
                    color: "blue".to_string(),
                    parts: 1,
                }],
            })
            .await?;
        info!("Reset drinks table, seeded drink {}", seeded.id);
        Ok(seeded)
    }
}

fn write_error(err: sqlx::Error, title: &str) -> RepoError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return RepoError::DuplicateTitle(title.to_string());
        }
    }
    RepoError::Sqlx(err)
}

#[async_trait]
impl DrinkStore for PgDrinkStore {
    async fn list_all(&self) -> Result<Vec<Drink>, RepoError> {
        let rows = sqlx::query_as::<_, DrinkRow>(&format!("{} ORDER BY id", SELECT_DRINKS))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Drink::try_from).collect()
    }

    async fn get_by_id(&self, id: i32) -> Result<Drink, RepoError> {
        sqlx::query_as::<_, DrinkRow>(&format!("{} WHERE id = $1", SELECT_DRINKS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepoError::NotFound(id))?
            .try_into()
    }

    async fn create(&self, draft: NewDrink) -> Result<Drink, RepoError> {
        let recipe = serde_json::to_string(&draft.recipe)?;
        sqlx::query_as::<_, DrinkRow>(
            "INSERT INTO drinks (title, recipe) VALUES ($1, $2) RETURNING id, title, recipe",
        )
        .bind(&draft.title)
        .bind(recipe)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, &draft.title))?
        .try_into()
    }

    async fn update_title(&self, id: i32, title: &str) -> Result<Drink, RepoError> {
        sqlx::query_as::<_, DrinkRow>(
            "UPDATE drinks SET title = $2 WHERE id = $1 RETURNING id, title, recipe",
        )
        .bind(id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, title))?
        .ok_or(RepoError::NotFound(id))?
        .try_into()
    }

    async fn delete_by_id(&self, id: i32) -> Result<i32, RepoError> {
        sqlx::query_scalar::<_, i32>("DELETE FROM drinks WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepoError::NotFound(id))
    }

    async fn ping(&self) -> Result<(), RepoError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
