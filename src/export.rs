use crate::database::models::{Recipe, RecipeIngredient};
use crate::matcher::{Plan, NO_SUITABLE_RECIPE};
use chrono::NaiveDateTime;

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.into()
    }
}

pub fn mealplan_csv(plan: &Plan) -> String {
    let mut csv = String::from("day,title,match\n");
    for day in &plan.days {
        let title = day.title.as_deref().unwrap_or(NO_SUITABLE_RECIPE);
        csv += &format!("{},{},{}\n", day.day, csv_field(title), day.score);
    }
    csv
}

pub fn mealplan_json(plan: &Plan, generated_on: NaiveDateTime) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({
        "week_start": plan.week_start,
        "generated_on": generated_on,
        "plan": &plan.days,
        "candidates": &plan.candidates,
    }))
}

pub fn recipe_csv(recipe: &Recipe, lines: &[RecipeIngredient]) -> String {
    let mut csv = String::new();
    csv += &format!("title,{}\n", csv_field(&recipe.title));
    csv += &format!(
        "description,{}\n",
        csv_field(recipe.description.as_deref().unwrap_or(""))
    );
    csv += &format!(
        "instructions,{}\n",
        csv_field(recipe.instructions.as_deref().unwrap_or(""))
    );
    csv += "\n";
    csv += "ingredient,qty,unit\n";
    for line in lines {
        csv += &format!(
            "{},{},{}\n",
            csv_field(&line.ingredient_name),
            line.required_quantity,
            csv_field(&line.unit)
        );
    }
    csv
}

pub fn recipe_json(recipe: &Recipe, lines: &[RecipeIngredient]) -> serde_json::Result<String> {
    let lines: Vec<_> = lines
        .iter()
        .map(|line| {
            serde_json::json!({
                "name": &line.ingredient_name,
                "qty": line.required_quantity,
                "unit": &line.unit,
            })
        })
        .collect();
    serde_json::to_string_pretty(&serde_json::json!({
        "title": &recipe.title,
        "description": &recipe.description,
        "instructions": &recipe.instructions,
        "ingredients": lines,
    }))
}

#[cfg(test)]
use crate::database::models::{RecipeId, RecipeIngredientId};
#[cfg(test)]
use crate::matcher::{Candidate, DayEntry};

#[cfg(test)]
fn test_plan() -> Plan {
    Plan {
        week_start: "2025-07-28".parse().unwrap(),
        days: vec![
            DayEntry {
                day: 1,
                title: Some("Fried Rice".into()),
                score: 1.0,
            },
            DayEntry {
                day: 2,
                title: None,
                score: 0.0,
            },
        ],
        candidates: vec![Candidate {
            title: "Fried Rice".into(),
            score: 1.0,
        }],
    }
}

#[test]
fn mealplan_csv_shape() {
    let csv = mealplan_csv(&test_plan());
    assert_eq!(
        csv,
        "day,title,match\n\
         1,Fried Rice,1\n\
         2,No suitable recipe,0\n"
    );
}

#[test]
fn mealplan_json_carries_week_and_timestamp() {
    let generated_on = "2025-07-28T09:15:00".parse().unwrap();
    let json = mealplan_json(&test_plan(), generated_on).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["week_start"], "2025-07-28");
    assert_eq!(value["generated_on"], "2025-07-28T09:15:00");
    assert_eq!(value["plan"][0]["title"], "Fried Rice");
    assert_eq!(value["plan"][1]["title"], NO_SUITABLE_RECIPE);
    assert_eq!(value["candidates"][0]["score"], 1.0);
}

#[test]
fn csv_fields_get_quoted_when_needed() {
    assert_eq!(csv_field("plain"), "plain");
    assert_eq!(csv_field("with, comma"), "\"with, comma\"");
    assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
}

#[test]
fn recipe_exports() {
    let recipe = Recipe {
        id: RecipeId::INITIAL,
        title: "Fried Rice".into(),
        description: Some("Quick, easy".into()),
        instructions: None,
        created_by: None,
    };
    let lines = vec![RecipeIngredient {
        id: RecipeIngredientId::INITIAL,
        recipe_id: RecipeId::INITIAL,
        ingredient_name: "Rice".into(),
        required_quantity: 2.0,
        unit: "cups".into(),
    }];

    let csv = recipe_csv(&recipe, &lines);
    assert_eq!(
        csv,
        "title,Fried Rice\n\
         description,\"Quick, easy\"\n\
         instructions,\n\
         \n\
         ingredient,qty,unit\n\
         Rice,2,cups\n"
    );

    let value: serde_json::Value =
        serde_json::from_str(&recipe_json(&recipe, &lines).unwrap()).unwrap();
    assert_eq!(value["title"], "Fried Rice");
    assert_eq!(value["instructions"], serde_json::Value::Null);
    assert_eq!(value["ingredients"][0]["name"], "Rice");
    assert_eq!(value["ingredients"][0]["qty"], 2.0);
}
