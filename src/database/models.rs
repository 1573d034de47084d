// Copyright 2023 Remi Bernotavicius

use diesel::associations::{Associations, Identifiable};
use diesel::deserialize::Queryable;
use diesel::expression::Selectable;
use diesel::prelude::Insertable;
use diesel_derive_newtype::DieselNewType;

#[derive(DieselNewType, Debug, Hash, PartialEq, Eq, Copy, Clone)]
pub struct UserId(i32);

impl UserId {
    pub const INITIAL: Self = Self(1);

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

/// The password hash stays out of the model; nothing here authenticates,
/// so lookups never select it.
#[derive(Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::database::schema::users)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

#[derive(DieselNewType, Debug, Hash, PartialEq, Eq, Copy, Clone)]
pub struct IngredientId(i32);

impl IngredientId {
    pub const INITIAL: Self = Self(1);

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

/// One line of a user's inventory. `unit` is free text ("pcs" when the user
/// didn't say); it only gains meaning when the matcher parses it.
#[derive(Associations, Queryable, Selectable, Identifiable, Clone)]
#[diesel(belongs_to(User))]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct Ingredient {
    pub id: IngredientId,
    pub user_id: UserId,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub notes: Option<String>,
}

#[derive(DieselNewType, Debug, Hash, PartialEq, Eq, Copy, Clone)]
pub struct RecipeId(i32);

impl RecipeId {
    pub const INITIAL: Self = Self(1);

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Clone)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub created_by: Option<UserId>,
}

#[derive(DieselNewType, Debug, Hash, PartialEq, Eq, Copy, Clone)]
pub struct RecipeIngredientId(i32);

impl RecipeIngredientId {
    pub const INITIAL: Self = Self(1);

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

/// A requirement line of a recipe. `ingredient_name` is deliberately not a
/// foreign key into `ingredients`; requirements and inventory are matched by
/// normalized name.
#[derive(Associations, Queryable, Selectable, Identifiable, Insertable, Clone)]
#[diesel(belongs_to(Recipe))]
#[diesel(table_name = crate::database::schema::recipe_ingredients)]
pub struct RecipeIngredient {
    pub id: RecipeIngredientId,
    pub recipe_id: RecipeId,
    pub ingredient_name: String,
    pub required_quantity: f64,
    pub unit: String,
}

#[derive(DieselNewType, Debug, Hash, PartialEq, Eq, Copy, Clone)]
pub struct MealPlanId(i32);

/// A stored weekly plan. Rows are append-only: regenerating a week inserts a
/// new row and the newest row wins.
#[derive(Associations, Queryable, Selectable, Identifiable, Clone)]
#[diesel(belongs_to(User))]
#[diesel(table_name = crate::database::schema::mealplans)]
pub struct MealPlan {
    pub id: MealPlanId,
    pub user_id: UserId,
    pub generated_on: chrono::NaiveDateTime,
    pub week_start: chrono::NaiveDate,
    pub plan_json: String,
}
