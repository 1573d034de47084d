// Copyright 2023 Remi Bernotavicius

use crate::database;
use crate::database::models::{
    Ingredient, MealPlan, Recipe, RecipeId, RecipeIngredient, RecipeIngredientId, User, UserId,
};
use diesel::prelude::OptionalExtension as _;
use diesel::BelongingToDsl as _;
use diesel::ExpressionMethods as _;
use diesel::GroupedBy as _;
use diesel::QueryDsl as _;
use diesel::QueryResult;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;

pub fn find_user(conn: &mut database::Connection, name: &str) -> QueryResult<Option<User>> {
    use database::schema::users::dsl::*;

    users
        .select(User::as_select())
        .filter(username.eq(name))
        .get_result(conn)
        .optional()
}

pub fn add_user(
    conn: &mut database::Connection,
    new_username: &str,
    new_email: &str,
    new_password_hash: &str,
) -> QueryResult<()> {
    use database::schema::users::dsl::*;
    use diesel::insert_into;

    insert_into(users)
        .values((
            username.eq(new_username),
            email.eq(new_email),
            password_hash.eq(new_password_hash),
        ))
        .execute(conn)?;
    Ok(())
}

pub fn ingredients_for_user(
    conn: &mut database::Connection,
    user: UserId,
) -> QueryResult<Vec<Ingredient>> {
    use database::schema::ingredients::dsl::*;

    ingredients
        .select(Ingredient::as_select())
        .filter(user_id.eq(user))
        .order(name.asc())
        .load(conn)
}

pub fn add_ingredient(
    conn: &mut database::Connection,
    user: UserId,
    new_name: &str,
    new_quantity: f64,
    new_unit: &str,
    new_notes: Option<&str>,
) -> QueryResult<()> {
    use database::schema::ingredients::dsl::*;
    use diesel::insert_into;

    insert_into(ingredients)
        .values((
            user_id.eq(user),
            name.eq(new_name),
            quantity.eq(new_quantity),
            unit.eq(new_unit),
            notes.eq(new_notes),
        ))
        .execute(conn)?;
    Ok(())
}

/// Removes every inventory line with the given name. Returns whether
/// anything was deleted.
pub fn delete_ingredient(
    conn: &mut database::Connection,
    user: UserId,
    delete_name: &str,
) -> QueryResult<bool> {
    use database::schema::ingredients::dsl::*;
    use diesel::delete;

    let deleted = delete(
        ingredients
            .filter(user_id.eq(user))
            .filter(name.eq(delete_name)),
    )
    .execute(conn)?;
    Ok(deleted > 0)
}

/// The whole catalog, each recipe paired with its requirement lines.
pub fn recipes_with_ingredients(
    conn: &mut database::Connection,
) -> QueryResult<Vec<(Recipe, Vec<RecipeIngredient>)>> {
    use database::schema::recipes::dsl::*;

    let all_recipes = recipes
        .select(Recipe::as_select())
        .order(title.asc())
        .load(conn)?;
    let requirements = RecipeIngredient::belonging_to(&all_recipes)
        .select(RecipeIngredient::as_select())
        .load(conn)?;
    Ok(requirements
        .grouped_by(&all_recipes)
        .into_iter()
        .zip(all_recipes)
        .map(|(lines, recipe)| (recipe, lines))
        .collect())
}

pub fn recipe_with_ingredients(
    conn: &mut database::Connection,
    recipe_id: i32,
) -> QueryResult<Option<(Recipe, Vec<RecipeIngredient>)>> {
    use database::schema::recipes::dsl::*;

    let Some(recipe) = recipes
        .select(Recipe::as_select())
        .filter(id.eq(recipe_id))
        .get_result(conn)
        .optional()?
    else {
        return Ok(None);
    };
    let lines = RecipeIngredient::belonging_to(&recipe)
        .select(RecipeIngredient::as_select())
        .load(conn)?;
    Ok(Some((recipe, lines)))
}

pub fn next_recipe_id(conn: &mut database::Connection) -> QueryResult<RecipeId> {
    use database::schema::recipes::dsl::*;

    let last: Option<RecipeId> = recipes.select(id).order(id.desc()).first(conn).optional()?;
    Ok(last.map(|l| l.next()).unwrap_or(RecipeId::INITIAL))
}

pub fn next_recipe_ingredient_id(
    conn: &mut database::Connection,
) -> QueryResult<RecipeIngredientId> {
    use database::schema::recipe_ingredients::dsl::*;

    let last: Option<RecipeIngredientId> = recipe_ingredients
        .select(id)
        .order(id.desc())
        .first(conn)
        .optional()?;
    Ok(last.map(|l| l.next()).unwrap_or(RecipeIngredientId::INITIAL))
}

/// The newest stored plan for the given week. Plans are append-only, so
/// "newest row" is "current plan".
pub fn latest_mealplan_for_week(
    conn: &mut database::Connection,
    user: UserId,
    week: chrono::NaiveDate,
) -> QueryResult<Option<MealPlan>> {
    use database::schema::mealplans::dsl::*;

    mealplans
        .select(MealPlan::as_select())
        .filter(user_id.eq(user))
        .filter(week_start.eq(week))
        .order(id.desc())
        .first(conn)
        .optional()
}

pub fn insert_mealplan(
    conn: &mut database::Connection,
    user: UserId,
    new_generated_on: chrono::NaiveDateTime,
    new_week_start: chrono::NaiveDate,
    new_plan_json: &str,
) -> QueryResult<()> {
    use database::schema::mealplans::dsl::*;
    use diesel::insert_into;

    insert_into(mealplans)
        .values((
            user_id.eq(user),
            generated_on.eq(new_generated_on),
            week_start.eq(new_week_start),
            plan_json.eq(new_plan_json),
        ))
        .execute(conn)?;
    Ok(())
}

#[cfg(test)]
fn test_connection() -> database::Connection {
    database::establish_connection(":memory:").unwrap()
}

#[test]
fn seeded_database_has_the_demo_user() {
    let mut conn = test_connection();

    let user = find_user(&mut conn, "demo").unwrap().unwrap();
    assert_eq!(user.email, "demo@example.com");
    assert!(!user.is_admin);

    assert!(find_user(&mut conn, "nobody").unwrap().is_none());
}

#[test]
fn inventory_loads_ordered_by_name() {
    let mut conn = test_connection();
    let user = find_user(&mut conn, "demo").unwrap().unwrap();

    let inventory = ingredients_for_user(&mut conn, user.id).unwrap();
    assert!(!inventory.is_empty());
    for pair in inventory.windows(2) {
        assert!(pair[0].name <= pair[1].name);
    }
}

#[test]
fn ingredients_can_be_added_and_deleted() {
    let mut conn = test_connection();
    let user = find_user(&mut conn, "demo").unwrap().unwrap();

    add_ingredient(&mut conn, user.id, "Butter", 250.0, "g", Some("salted")).unwrap();
    let inventory = ingredients_for_user(&mut conn, user.id).unwrap();
    let butter = inventory.iter().find(|i| i.name == "Butter").unwrap();
    assert_eq!(butter.quantity, 250.0);
    assert_eq!(butter.unit, "g");
    assert_eq!(butter.notes.as_deref(), Some("salted"));

    assert!(delete_ingredient(&mut conn, user.id, "Butter").unwrap());
    assert!(!delete_ingredient(&mut conn, user.id, "Butter").unwrap());
}

#[test]
fn catalog_groups_requirement_lines_under_their_recipes() {
    let mut conn = test_connection();

    let catalog = recipes_with_ingredients(&mut conn).unwrap();
    for pair in catalog.windows(2) {
        assert!(pair[0].0.title <= pair[1].0.title);
    }

    let (recipe, lines) = catalog
        .iter()
        .find(|(recipe, _)| recipe.title == "Fried Rice")
        .unwrap();
    assert_eq!(lines.len(), 4);
    for line in lines {
        assert_eq!(line.recipe_id, recipe.id);
    }
}

#[test]
fn mealplan_rows_are_append_only() {
    let mut conn = test_connection();
    let user = find_user(&mut conn, "demo").unwrap().unwrap();
    let week = "2025-07-28".parse().unwrap();

    let seeded = latest_mealplan_for_week(&mut conn, user.id, week)
        .unwrap()
        .unwrap();

    let generated_on = "2025-07-29T08:00:00".parse().unwrap();
    insert_mealplan(&mut conn, user.id, generated_on, week, "{\"plan\":[],\"candidates\":[]}")
        .unwrap();

    let latest = latest_mealplan_for_week(&mut conn, user.id, week)
        .unwrap()
        .unwrap();
    assert_ne!(latest.id, seeded.id);
    assert_eq!(latest.generated_on, generated_on);

    // the seeded row is still there, untouched
    use database::schema::mealplans::dsl::{mealplans, user_id, week_start};
    let count: i64 = mealplans
        .filter(user_id.eq(user.id))
        .filter(week_start.eq(week))
        .count()
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(count, 2);
}
