// Copyright 2023 Remi Bernotavicius

use crate::database;
use crate::database::models::{Recipe, RecipeIngredient};
use crate::query;
use crate::Result;
use diesel::RunQueryDsl as _;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
struct ImportedIngredient {
    name: String,
    #[serde(default = "default_quantity")]
    quantity: f64,
    #[serde(default = "default_unit")]
    unit: String,
}

fn default_quantity() -> f64 {
    1.0
}

fn default_unit() -> String {
    "pcs".into()
}

#[derive(Deserialize)]
struct ImportedRecipe {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default)]
    ingredients: Vec<ImportedIngredient>,
}

/// Imports recipes from a JSON file: an array of objects with a `title` and
/// an `ingredients` array of `{name, quantity, unit}` lines. Imported
/// recipes have no creator.
pub fn import_recipes(mut conn: database::Connection, path: impl AsRef<Path>) -> Result<()> {
    let file = std::fs::File::open(path)?;
    let imported: Vec<ImportedRecipe> = serde_json::from_reader(file)?;
    let total = imported.len();

    let mut recipe_id = query::next_recipe_id(&mut conn)?;
    let mut recipe_ingredient_id = query::next_recipe_ingredient_id(&mut conn)?;
    for (num, imported_recipe) in imported.into_iter().enumerate() {
        for line in &imported_recipe.ingredients {
            if line.quantity < 0.0 {
                return Err(format!(
                    "recipe {:?} requires a negative quantity of {:?}",
                    imported_recipe.title, line.name
                )
                .into());
            }
        }

        let new_recipe = Recipe {
            id: recipe_id,
            title: imported_recipe.title,
            description: imported_recipe.description,
            instructions: imported_recipe.instructions,
            created_by: None,
        };
        diesel::insert_into(database::schema::recipes::dsl::recipes)
            .values(new_recipe)
            .execute(&mut conn)?;

        for line in imported_recipe.ingredients {
            let new_line = RecipeIngredient {
                id: recipe_ingredient_id,
                recipe_id,
                ingredient_name: line.name,
                required_quantity: line.quantity,
                unit: line.unit,
            };
            diesel::insert_into(
                database::schema::recipe_ingredients::dsl::recipe_ingredients,
            )
            .values(new_line)
            .execute(&mut conn)?;
            recipe_ingredient_id = recipe_ingredient_id.next();
        }

        recipe_id = recipe_id.next();
        println!("imported {}/{total}", num + 1);
    }

    Ok(())
}
