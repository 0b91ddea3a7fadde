pub mod drink;

pub use drink::{title_from_json, DraftError, Drink, Ingredient, LongDrink, NewDrink, ShortDrink};
