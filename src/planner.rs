// Copyright 2023 Remi Bernotavicius

use crate::database;
use crate::database::models::User;
use crate::matcher::{Matcher, Plan};
use crate::query;
use crate::Result;
use chrono::{NaiveDate, NaiveDateTime, Weekday};

pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    date.week(Weekday::Mon).first_day()
}

pub struct WeeklyPlan {
    pub plan: Plan,
    pub generated_on: NaiveDateTime,
}

/// The current plan for the week containing `today`, generating and storing
/// one if the user doesn't have one yet.
pub fn weekly_plan_for(
    conn: &mut database::Connection,
    user: &User,
    today: NaiveDate,
) -> Result<WeeklyPlan> {
    let week_start = week_start_of(today);
    if let Some(stored) = query::latest_mealplan_for_week(conn, user.id, week_start)? {
        match Plan::from_stored(stored.week_start, &stored.plan_json) {
            Ok(plan) => {
                return Ok(WeeklyPlan {
                    plan,
                    generated_on: stored.generated_on,
                })
            }
            Err(error) => {
                log::warn!("stored plan for week of {week_start} is unreadable ({error}), regenerating");
            }
        }
    }
    regenerate(conn, user, today)
}

/// Plans the week from a fresh snapshot of the inventory and catalog and
/// appends the result as a new row. Older rows for the week are kept as-is.
pub fn regenerate(
    conn: &mut database::Connection,
    user: &User,
    today: NaiveDate,
) -> Result<WeeklyPlan> {
    let week_start = week_start_of(today);
    let inventory = query::ingredients_for_user(conn, user.id)?;
    let catalog = query::recipes_with_ingredients(conn)?;

    let plan = Matcher::default().generate(&inventory, &catalog, &week_start.to_string())?;
    let generated_on = chrono::Local::now().naive_local();
    query::insert_mealplan(conn, user.id, generated_on, week_start, &plan.to_json()?)?;
    log::info!(
        "generated plan for {} for the week of {week_start}",
        user.username
    );
    Ok(WeeklyPlan { plan, generated_on })
}

#[cfg(test)]
fn test_setup() -> (database::Connection, User) {
    let mut conn = database::establish_connection(":memory:").unwrap();
    let user = query::find_user(&mut conn, "demo").unwrap().unwrap();
    (conn, user)
}

#[test]
fn week_starts_on_monday() {
    let monday: NaiveDate = "2025-07-28".parse().unwrap();
    assert_eq!(week_start_of(monday), monday);

    let thursday: NaiveDate = "2025-07-31".parse().unwrap();
    assert_eq!(week_start_of(thursday), monday);

    let sunday: NaiveDate = "2025-08-03".parse().unwrap();
    assert_eq!(week_start_of(sunday), monday);
}

#[test]
fn existing_plans_are_returned_unchanged() {
    let (mut conn, user) = test_setup();

    // the seed data stores a plan for this week already
    let today = "2025-07-30".parse().unwrap();
    let weekly = weekly_plan_for(&mut conn, &user, today).unwrap();
    assert_eq!(weekly.plan.week_start, "2025-07-28".parse().unwrap());
    assert_eq!(weekly.plan.days[0].title.as_deref(), Some("Fried Rice"));
    assert_eq!(weekly.plan.days[6].title, None);

    // asking again changes nothing
    let again = weekly_plan_for(&mut conn, &user, today).unwrap();
    assert_eq!(again.plan, weekly.plan);
    assert_eq!(again.generated_on, weekly.generated_on);
}

#[test]
fn a_week_without_a_plan_gets_one_generated_and_stored() {
    let (mut conn, user) = test_setup();

    let today: NaiveDate = "2025-08-06".parse().unwrap();
    let week_start = week_start_of(today);
    assert!(query::latest_mealplan_for_week(&mut conn, user.id, week_start)
        .unwrap()
        .is_none());

    let weekly = weekly_plan_for(&mut conn, &user, today).unwrap();
    assert_eq!(weekly.plan.week_start, week_start);
    assert_eq!(weekly.plan.days.len(), 7);

    let stored = query::latest_mealplan_for_week(&mut conn, user.id, week_start)
        .unwrap()
        .unwrap();
    let parsed = Plan::from_stored(stored.week_start, &stored.plan_json).unwrap();
    assert_eq!(parsed, weekly.plan);
}

#[test]
fn regenerating_appends_instead_of_overwriting() {
    let (mut conn, user) = test_setup();

    let today: NaiveDate = "2025-07-30".parse().unwrap();
    let week_start = week_start_of(today);
    let seeded = query::latest_mealplan_for_week(&mut conn, user.id, week_start)
        .unwrap()
        .unwrap();

    let weekly = regenerate(&mut conn, &user, today).unwrap();
    let latest = query::latest_mealplan_for_week(&mut conn, user.id, week_start)
        .unwrap()
        .unwrap();
    assert_ne!(latest.id, seeded.id);
    assert_eq!(
        Plan::from_stored(latest.week_start, &latest.plan_json).unwrap(),
        weekly.plan
    );

    // the seeded row survives regeneration
    use crate::database::schema::mealplans::dsl::{mealplans, user_id};
    use diesel::ExpressionMethods as _;
    use diesel::QueryDsl as _;
    use diesel::RunQueryDsl as _;
    let count: i64 = mealplans
        .filter(user_id.eq(user.id))
        .count()
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(count, 2);
}
