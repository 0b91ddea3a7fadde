use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One line of a drink recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: i64,
}

/// A menu item with its storage-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drink {
    pub id: i32,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Public projection: ingredient names are withheld.
#[derive(Debug, Serialize)]
pub struct ShortDrink<'a> {
    pub id: i32,
    pub title: &'a str,
    pub recipe: Vec<ShortIngredient<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ShortIngredient<'a> {
    pub color: &'a str,
    pub parts: i64,
}

/// Detail projection, the full recipe.
#[derive(Debug, Serialize)]
pub struct LongDrink<'a> {
    pub id: i32,
    pub title: &'a str,
    pub recipe: &'a [Ingredient],
}

impl Drink {
    pub fn short(&self) -> ShortDrink<'_> {
        ShortDrink {
            id: self.id,
            title: &self.title,
            recipe: self
                .recipe
                .iter()
                .map(|i| ShortIngredient {
                    color: &i.color,
                    parts: i.parts,
                })
                .collect(),
        }
    }

    pub fn long(&self) -> LongDrink<'_> {
        LongDrink {
            id: self.id,
            title: &self.title,
            recipe: &self.recipe,
        }
    }
}

/// Request-shape failures for drink payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// A drink that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

impl NewDrink {
    /// Both `title` and `recipe` keys must be present; their values must be
    /// a string and a list of ingredients.
    pub fn from_json(body: &Value) -> Result<Self, DraftError> {
        let title = body.get("title").ok_or(DraftError::MissingField("title"))?;
        let recipe = body.get("recipe").ok_or(DraftError::MissingField("recipe"))?;

        let title = title.as_str().ok_or_else(|| DraftError::InvalidField {
            field: "title",
            reason: "expected a string".to_string(),
        })?;

        let recipe: Vec<Ingredient> =
            serde_json::from_value(recipe.clone()).map_err(|e| DraftError::InvalidField {
                field: "recipe",
                reason: e.to_string(),
            })?;

        Ok(Self {
            title: title.to_string(),
            recipe,
        })
    }
}

/// Extract the replacement title from a PATCH body. An absent or null title
/// is a missing field.
pub fn title_from_json(body: &Value) -> Result<String, DraftError> {
    match body.get("title") {
        None | Some(Value::Null) => Err(DraftError::MissingField("title")),
        Some(Value::String(title)) => Ok(title.clone()),
        Some(_) => Err(DraftError::InvalidField {
            field: "title",
            reason: "expected a string".to_string(),
        }),
    }
}
