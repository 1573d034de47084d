// Copyright 2023 Remi Bernotavicius

use crate::database::models::{Ingredient, Recipe, RecipeIngredient};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use thiserror::Error;

pub mod units;

use units::{conversion_factor, Unit};

pub const DAYS_PER_WEEK: usize = 7;

/// Stored in place of a recipe title for days no recipe could be found for.
pub const NO_SUITABLE_RECIPE: &str = "No suitable recipe";

#[derive(Debug, Error, PartialEq)]
pub enum InvalidInput {
    #[error("unparseable week start date {0:?}")]
    WeekStart(String),
    #[error("negative quantity {quantity} for {name:?}")]
    NegativeQuantity { name: String, quantity: f64 },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DayEntry {
    pub day: u8,
    #[serde(with = "sentinel_title")]
    pub title: Option<String>,
    #[serde(rename = "match")]
    pub score: f64,
}

/// A recipe considered for day one, with its score against the full
/// inventory. Kept in the stored payload for auditing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub week_start: NaiveDate,
    pub days: Vec<DayEntry>,
    pub candidates: Vec<Candidate>,
}

/// The persisted `plan_json` shape. `week_start` lives in its own database
/// column, so it is not part of the payload.
#[derive(Serialize)]
struct PlanPayloadRef<'a> {
    plan: &'a [DayEntry],
    candidates: &'a [Candidate],
}

#[derive(Deserialize)]
struct PlanPayload {
    plan: Vec<DayEntry>,
    candidates: Vec<Candidate>,
}

impl Plan {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&PlanPayloadRef {
            plan: &self.days,
            candidates: &self.candidates,
        })
    }

    pub fn from_stored(week_start: NaiveDate, json: &str) -> serde_json::Result<Self> {
        let payload: PlanPayload = serde_json::from_str(json)?;
        Ok(Self {
            week_start,
            days: payload.plan,
            candidates: payload.candidates,
        })
    }
}

mod sentinel_title {
    use serde::{Deserialize as _, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        title: &Option<String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(title.as_deref().unwrap_or(super::NO_SUITABLE_RECIPE))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let title = String::deserialize(deserializer)?;
        Ok((title != super::NO_SUITABLE_RECIPE).then_some(title))
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Conversion factor from quantities in `a` to quantities in `b`. Units that
/// don't parse into [`Unit`] only convert to themselves, verbatim.
fn unit_factor(a_raw: &str, a: Option<Unit>, b_raw: &str, b: Option<Unit>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => conversion_factor(a, b),
        (None, None) => (a_raw == b_raw).then_some(1.0),
        _ => None,
    }
}

struct StockLine {
    quantity: f64,
    unit_raw: String,
    unit: Option<Unit>,
}

/// Working copy of a user's inventory, keyed by normalized name. Duplicate
/// inventory rows with interconvertible units are merged on build; the rest
/// stay as separate lines under the same name.
struct Stock {
    lines: HashMap<String, Vec<StockLine>>,
}

impl Stock {
    fn build(inventory: &[Ingredient]) -> Result<Self, InvalidInput> {
        let mut lines: HashMap<String, Vec<StockLine>> = HashMap::new();
        for item in inventory {
            if item.quantity < 0.0 {
                return Err(InvalidInput::NegativeQuantity {
                    name: item.name.clone(),
                    quantity: item.quantity,
                });
            }
            let unit_raw = normalize(&item.unit);
            let unit = Unit::parse(&item.unit);
            let entry = lines.entry(normalize(&item.name)).or_default();
            let existing = entry.iter().enumerate().find_map(|(index, line)| {
                unit_factor(&unit_raw, unit, &line.unit_raw, line.unit)
                    .map(|factor| (index, factor))
            });
            match existing {
                Some((index, factor)) => entry[index].quantity += item.quantity * factor,
                None => entry.push(StockLine {
                    quantity: item.quantity,
                    unit_raw,
                    unit,
                }),
            }
        }
        Ok(Self { lines })
    }

    /// Looks a normalized name up, falling back to stripping one trailing
    /// plural "s" when the exact name isn't stocked.
    fn key_for<'a>(&self, name: &'a str) -> Option<&'a str> {
        if self.lines.contains_key(name) {
            Some(name)
        } else {
            name.strip_suffix('s').filter(|n| self.lines.contains_key(*n))
        }
    }

    /// Total on hand for `name` expressed in the given unit, or `None` when
    /// nothing with a convertible unit is stocked under the name.
    fn available(&self, name: &str, unit_raw: &str, unit: Option<Unit>) -> Option<f64> {
        let key = self.key_for(name)?;
        let mut total = None;
        for line in &self.lines[key] {
            if let Some(factor) = unit_factor(&line.unit_raw, line.unit, unit_raw, unit) {
                *total.get_or_insert(0.0) += line.quantity * factor;
            }
        }
        total
    }

    fn contribution(&self, requirement: &RecipeIngredient) -> f64 {
        let name = normalize(&requirement.ingredient_name);
        let unit_raw = normalize(&requirement.unit);
        let unit = Unit::parse(&requirement.unit);
        match self.available(&name, &unit_raw, unit) {
            None => 0.0,
            Some(_) if requirement.required_quantity <= 0.0 => 1.0,
            Some(available) => (available / requirement.required_quantity).min(1.0),
        }
    }

    /// Removes the required quantity from the stocked lines it can convert
    /// into, never going below zero.
    fn deduct(&mut self, requirement: &RecipeIngredient) {
        let name = normalize(&requirement.ingredient_name);
        let unit_raw = normalize(&requirement.unit);
        let unit = Unit::parse(&requirement.unit);
        let Some(key) = self.key_for(&name) else {
            return;
        };
        let mut remaining = requirement.required_quantity;
        for line in self.lines.get_mut(key).into_iter().flatten() {
            if remaining <= 0.0 {
                break;
            }
            let Some(factor) = unit_factor(&unit_raw, unit, &line.unit_raw, line.unit) else {
                continue;
            };
            let taken = (remaining * factor).min(line.quantity);
            line.quantity -= taken;
            remaining -= taken / factor;
        }
    }
}

fn score_recipe(stock: &Stock, requirements: &[RecipeIngredient]) -> f64 {
    if requirements.is_empty() {
        return 0.0;
    }
    let total: f64 = requirements.iter().map(|r| stock.contribution(r)).sum();
    total / requirements.len() as f64
}

struct Scored {
    index: usize,
    score: f64,
}

/// Higher score first, then more requirement lines, then title. Total order,
/// so identical inputs always plan identically.
fn plan_order(catalog: &[(Recipe, Vec<RecipeIngredient>)], a: &Scored, b: &Scored) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| catalog[b.index].1.len().cmp(&catalog[a.index].1.len()))
        .then_with(|| catalog[a.index].0.title.cmp(&catalog[b.index].0.title))
}

pub struct Matcher {
    min_score: f64,
}

impl Default for Matcher {
    fn default() -> Self {
        Self { min_score: 0.0 }
    }
}

impl Matcher {
    pub fn with_min_score(min_score: f64) -> Self {
        Self { min_score }
    }

    /// Plans a week of meals. Inventory and catalog are read-only; scoring
    /// and deduction happen against a working copy, so calling this twice
    /// with the same input gives the same plan.
    pub fn generate(
        &self,
        inventory: &[Ingredient],
        catalog: &[(Recipe, Vec<RecipeIngredient>)],
        week_start: &str,
    ) -> Result<Plan, InvalidInput> {
        let week_start: NaiveDate = week_start
            .parse()
            .map_err(|_| InvalidInput::WeekStart(week_start.into()))?;

        for (_, requirements) in catalog {
            for requirement in requirements {
                if requirement.required_quantity < 0.0 {
                    return Err(InvalidInput::NegativeQuantity {
                        name: requirement.ingredient_name.clone(),
                        quantity: requirement.required_quantity,
                    });
                }
            }
        }

        let mut stock = Stock::build(inventory)?;

        let mut candidates: Vec<Scored> = (0..catalog.len())
            .map(|index| Scored {
                index,
                score: score_recipe(&stock, &catalog[index].1),
            })
            .collect();
        candidates.sort_by(|a, b| plan_order(catalog, a, b));
        let candidates = candidates
            .into_iter()
            .map(|c| Candidate {
                title: catalog[c.index].0.title.clone(),
                score: c.score,
            })
            .collect();

        let mut used = vec![false; catalog.len()];
        let mut days = Vec::with_capacity(DAYS_PER_WEEK);
        for day in 1..=DAYS_PER_WEEK as u8 {
            // no repeats while every recipe hasn't had a day yet; with a
            // catalog smaller than the week, repeats open up afterwards
            let allow_repeats = day as usize > catalog.len();
            let best = (0..catalog.len())
                .filter(|&index| allow_repeats || !used[index])
                .map(|index| Scored {
                    index,
                    score: score_recipe(&stock, &catalog[index].1),
                })
                .min_by(|a, b| plan_order(catalog, a, b));
            match best {
                Some(best) if best.score > self.min_score => {
                    let (recipe, requirements) = &catalog[best.index];
                    for requirement in requirements {
                        stock.deduct(requirement);
                    }
                    used[best.index] = true;
                    days.push(DayEntry {
                        day,
                        title: Some(recipe.title.clone()),
                        score: best.score,
                    });
                }
                _ => days.push(DayEntry {
                    day,
                    title: None,
                    score: 0.0,
                }),
            }
        }

        Ok(Plan {
            week_start,
            days,
            candidates,
        })
    }
}

#[cfg(test)]
use crate::database::models::{IngredientId, RecipeId, RecipeIngredientId, UserId};

#[cfg(test)]
fn test_inventory(items: &[(&str, f64, &str)]) -> Vec<Ingredient> {
    let mut id = IngredientId::INITIAL;
    items
        .iter()
        .map(|&(name, quantity, unit)| {
            let item = Ingredient {
                id,
                user_id: UserId::INITIAL,
                name: name.into(),
                quantity,
                unit: unit.into(),
                notes: None,
            };
            id = id.next();
            item
        })
        .collect()
}

#[cfg(test)]
fn test_catalog(
    recipes: &[(&str, &[(&str, f64, &str)])],
) -> Vec<(Recipe, Vec<RecipeIngredient>)> {
    let mut recipe_id = RecipeId::INITIAL;
    let mut requirement_id = RecipeIngredientId::INITIAL;
    recipes
        .iter()
        .map(|&(title, requirements)| {
            let recipe = Recipe {
                id: recipe_id,
                title: title.into(),
                description: None,
                instructions: None,
                created_by: None,
            };
            let requirements = requirements
                .iter()
                .map(|&(name, quantity, unit)| {
                    let requirement = RecipeIngredient {
                        id: requirement_id,
                        recipe_id,
                        ingredient_name: name.into(),
                        required_quantity: quantity,
                        unit: unit.into(),
                    };
                    requirement_id = requirement_id.next();
                    requirement
                })
                .collect();
            recipe_id = recipe_id.next();
            (recipe, requirements)
        })
        .collect()
}

#[cfg(test)]
const WEEK: &str = "2025-07-28";

#[cfg(test)]
fn titles(plan: &Plan) -> Vec<Option<&str>> {
    plan.days.iter().map(|d| d.title.as_deref()).collect()
}

#[test]
fn empty_catalog_gives_a_sentinel_week() {
    let inventory = test_inventory(&[("Rice", 10.0, "cups")]);
    let plan = Matcher::default().generate(&inventory, &[], WEEK).unwrap();

    assert_eq!(plan.week_start, WEEK.parse().unwrap());
    assert_eq!(plan.days.len(), DAYS_PER_WEEK);
    for (num, day) in plan.days.iter().enumerate() {
        assert_eq!(day.day as usize, num + 1);
        assert_eq!(day.title, None);
        assert_eq!(day.score, 0.0);
    }
    assert_eq!(plan.candidates, vec![]);
}

#[test]
fn inventory_depletes_across_the_week() {
    let inventory = test_inventory(&[("Rice", 10.0, "cups")]);
    let catalog = test_catalog(&[("Fried Rice", &[("Rice", 2.0, "cups")])]);
    let plan = Matcher::default()
        .generate(&inventory, &catalog, WEEK)
        .unwrap();

    // ten cups cover five servings of two; days six and seven go hungry
    for day in &plan.days[..5] {
        assert_eq!(day.title.as_deref(), Some("Fried Rice"));
        assert_eq!(day.score, 1.0);
    }
    for day in &plan.days[5..] {
        assert_eq!(day.title, None);
        assert_eq!(day.score, 0.0);
    }
}

#[test]
fn depletion_gives_partial_scores_before_running_out() {
    let inventory = test_inventory(&[("Rice", 3.0, "cups")]);
    let catalog = test_catalog(&[("Fried Rice", &[("Rice", 2.0, "cups")])]);
    let plan = Matcher::default()
        .generate(&inventory, &catalog, WEEK)
        .unwrap();

    assert_eq!(plan.days[0].score, 1.0);
    assert_eq!(plan.days[1].title.as_deref(), Some("Fried Rice"));
    assert_eq!(plan.days[1].score, 0.5);
    assert_eq!(plan.days[2].title, None);
}

#[test]
fn generation_is_deterministic() {
    let inventory = test_inventory(&[
        ("Rice", 4.0, "cups"),
        ("Eggs", 6.0, "pcs"),
        ("Milk", 1.0, "l"),
    ]);
    let catalog = test_catalog(&[
        ("Fried Rice", &[("Rice", 2.0, "cups"), ("Eggs", 2.0, "pcs")]),
        ("Omelette", &[("Eggs", 3.0, "pcs"), ("Milk", 100.0, "ml")]),
    ]);

    let matcher = Matcher::default();
    let first = matcher.generate(&inventory, &catalog, WEEK).unwrap();
    let second = matcher.generate(&inventory, &catalog, WEEK).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.to_json().unwrap(),
        second.to_json().unwrap()
    );
}

#[test]
fn a_week_is_seven_increasing_days_with_scores_in_range() {
    let inventory = test_inventory(&[("Eggs", 5.0, "pcs")]);
    let catalog = test_catalog(&[
        ("Omelette", &[("Eggs", 3.0, "pcs")]),
        ("Fried Egg", &[("Eggs", 1.0, "pcs"), ("Butter", 10.0, "g")]),
    ]);
    let plan = Matcher::default()
        .generate(&inventory, &catalog, WEEK)
        .unwrap();

    assert_eq!(plan.days.len(), DAYS_PER_WEEK);
    for (num, day) in plan.days.iter().enumerate() {
        assert_eq!(day.day as usize, num + 1);
        assert!(day.score >= 0.0 && day.score <= 1.0);
    }
}

#[test]
fn equal_scores_tie_break_on_lexicographic_title() {
    let inventory = test_inventory(&[("Flour", 100.0, "g")]);
    let catalog = test_catalog(&[
        ("Banana Bread", &[("Flour", 1.0, "g")]),
        ("Apple Pie", &[("Flour", 1.0, "g")]),
    ]);
    let plan = Matcher::default()
        .generate(&inventory, &catalog, WEEK)
        .unwrap();

    // day three onward repeats are allowed and the tie-break keeps picking
    // the lexicographically first title
    assert_eq!(
        titles(&plan),
        vec![
            Some("Apple Pie"),
            Some("Banana Bread"),
            Some("Apple Pie"),
            Some("Apple Pie"),
            Some("Apple Pie"),
            Some("Apple Pie"),
            Some("Apple Pie"),
        ]
    );
}

#[test]
fn equal_scores_prefer_the_more_substantial_recipe() {
    let inventory = test_inventory(&[("Eggs", 20.0, "pcs"), ("Milk", 5.0, "l")]);
    let catalog = test_catalog(&[
        ("Boiled Egg", &[("Eggs", 1.0, "pcs")]),
        (
            "Omelette",
            &[("Eggs", 2.0, "pcs"), ("Milk", 100.0, "ml")],
        ),
    ]);
    let plan = Matcher::default()
        .generate(&inventory, &catalog, WEEK)
        .unwrap();

    assert_eq!(plan.days[0].title.as_deref(), Some("Omelette"));
    assert_eq!(plan.days[1].title.as_deref(), Some("Boiled Egg"));
}

#[test]
fn recipes_without_requirements_score_zero_and_never_win() {
    let inventory = test_inventory(&[("Eggs", 20.0, "pcs")]);
    let catalog = test_catalog(&[
        ("Mystery Meal", &[]),
        ("Boiled Egg", &[("Eggs", 1.0, "pcs")]),
    ]);
    let plan = Matcher::default()
        .generate(&inventory, &catalog, WEEK)
        .unwrap();

    assert_eq!(plan.days[0].title.as_deref(), Some("Boiled Egg"));
    // day two only the zero-requirement recipe is left, which can't be served
    assert_eq!(plan.days[1].title, None);
    // from day three repeats are allowed again
    assert_eq!(plan.days[2].title.as_deref(), Some("Boiled Egg"));

    let mystery = plan
        .candidates
        .iter()
        .find(|c| c.title == "Mystery Meal")
        .unwrap();
    assert_eq!(mystery.score, 0.0);
}

#[test]
fn names_match_case_insensitively_and_across_simple_plurals() {
    let inventory = test_inventory(&[("Egg", 4.0, "pcs")]);
    let catalog = test_catalog(&[("Omelette", &[("EGGS", 2.0, "pcs")])]);
    let plan = Matcher::default()
        .generate(&inventory, &catalog, WEEK)
        .unwrap();

    assert_eq!(plan.days[0].title.as_deref(), Some("Omelette"));
    assert_eq!(plan.days[0].score, 1.0);
}

#[test]
fn duplicate_inventory_lines_are_summed() {
    let inventory = test_inventory(&[
        ("rice", 1.0, "cups"),
        ("Rice ", 1.0, "cups"),
    ]);
    let catalog = test_catalog(&[("Fried Rice", &[("Rice", 2.0, "cups")])]);
    let plan = Matcher::default()
        .generate(&inventory, &catalog, WEEK)
        .unwrap();

    assert_eq!(plan.days[0].score, 1.0);
}

#[test]
fn quantities_convert_between_units_when_scoring() {
    let inventory = test_inventory(&[("Milk", 1.0, "l")]);
    let catalog = test_catalog(&[("Pancakes", &[("Milk", 500.0, "ml")])]);
    let plan = Matcher::default()
        .generate(&inventory, &catalog, WEEK)
        .unwrap();

    assert_eq!(plan.days[0].score, 1.0);
    // a liter covers two 500 ml days
    assert_eq!(plan.days[1].score, 1.0);
    assert_eq!(plan.days[2].title, None);
}

#[test]
fn unconvertible_units_score_zero() {
    let inventory = test_inventory(&[("Rice", 500.0, "g")]);
    let catalog = test_catalog(&[("Fried Rice", &[("Rice", 2.0, "cups")])]);
    let plan = Matcher::default()
        .generate(&inventory, &catalog, WEEK)
        .unwrap();

    assert_eq!(plan.days[0].title, None);
    assert_eq!(plan.days[0].score, 0.0);
}

#[test]
fn unknown_units_only_match_themselves() {
    let inventory = test_inventory(&[("Basil", 2.0, "bunch"), ("Mint", 1.0, "sprig")]);
    let catalog = test_catalog(&[
        ("Pesto", &[("Basil", 1.0, "bunch")]),
        ("Tea", &[("Mint", 1.0, "pcs")]),
    ]);
    let plan = Matcher::default()
        .generate(&inventory, &catalog, WEEK)
        .unwrap();

    assert_eq!(plan.days[0].title.as_deref(), Some("Pesto"));
    let tea = plan.candidates.iter().find(|c| c.title == "Tea").unwrap();
    assert_eq!(tea.score, 0.0);
}

#[test]
fn negative_quantities_are_rejected() {
    let inventory = test_inventory(&[("Rice", -1.0, "cups")]);
    assert_eq!(
        Matcher::default().generate(&inventory, &[], WEEK),
        Err(InvalidInput::NegativeQuantity {
            name: "Rice".into(),
            quantity: -1.0
        })
    );

    let inventory = test_inventory(&[("Rice", 1.0, "cups")]);
    let catalog = test_catalog(&[("Fried Rice", &[("Rice", -2.0, "cups")])]);
    assert_eq!(
        Matcher::default().generate(&inventory, &catalog, WEEK),
        Err(InvalidInput::NegativeQuantity {
            name: "Rice".into(),
            quantity: -2.0
        })
    );
}

#[test]
fn scores_below_the_minimum_go_unplanned() {
    let inventory = test_inventory(&[("Rice", 1.0, "cups"), ("Eggs", 1.0, "pcs")]);
    let catalog = test_catalog(&[(
        "Fried Rice",
        &[("Rice", 2.0, "cups"), ("Eggs", 1.0, "pcs")],
    )]);

    // covered three quarters, which a strict threshold refuses
    let plan = Matcher::with_min_score(0.8)
        .generate(&inventory, &catalog, WEEK)
        .unwrap();
    assert_eq!(plan.days[0].title, None);
    assert_eq!(plan.days[0].score, 0.0);

    // the default threshold only refuses hard zeroes
    let plan = Matcher::default()
        .generate(&inventory, &catalog, WEEK)
        .unwrap();
    assert_eq!(plan.days[0].title.as_deref(), Some("Fried Rice"));
    assert_eq!(plan.days[0].score, 0.75);
}

#[test]
fn malformed_week_start_is_rejected() {
    assert_eq!(
        Matcher::default().generate(&[], &[], "not-a-date"),
        Err(InvalidInput::WeekStart("not-a-date".into()))
    );
}

#[test]
fn candidates_hold_raw_scores_from_before_any_depletion() {
    let inventory = test_inventory(&[("Rice", 2.0, "cups"), ("Eggs", 2.0, "pcs")]);
    let catalog = test_catalog(&[
        ("Fried Rice", &[("Rice", 2.0, "cups")]),
        ("Omelette", &[("Eggs", 2.0, "pcs")]),
    ]);
    let plan = Matcher::default()
        .generate(&inventory, &catalog, WEEK)
        .unwrap();

    // both start fully covered even though serving one depletes nothing the
    // other needs; candidate order follows the tie-break
    assert_eq!(
        plan.candidates,
        vec![
            Candidate {
                title: "Fried Rice".into(),
                score: 1.0
            },
            Candidate {
                title: "Omelette".into(),
                score: 1.0
            },
        ]
    );
}

#[test]
fn plans_round_trip_through_the_stored_payload() {
    let inventory = test_inventory(&[("Rice", 4.0, "cups")]);
    let catalog = test_catalog(&[("Fried Rice", &[("Rice", 2.0, "cups")])]);
    let plan = Matcher::default()
        .generate(&inventory, &catalog, WEEK)
        .unwrap();

    // the plan has both real and sentinel days, so both title encodings are
    // exercised
    assert!(plan.days.iter().any(|d| d.title.is_some()));
    assert!(plan.days.iter().any(|d| d.title.is_none()));

    let json = plan.to_json().unwrap();
    assert!(json.contains(&format!("\"title\":\"{NO_SUITABLE_RECIPE}\"")));
    let parsed = Plan::from_stored(plan.week_start, &json).unwrap();
    assert_eq!(parsed, plan);
}
