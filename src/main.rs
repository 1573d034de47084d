// Copyright 2023 Remi Bernotavicius

use chrono::Datelike as _;
use chrono::NaiveDate;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use std::path::PathBuf;

mod database;
mod export;
mod import;
mod matcher;
mod planner;
mod query;

type Error = Box<dyn std::error::Error + Send + Sync + 'static>;
type Result<T> = std::result::Result<T, Error>;

#[derive(Parser, Debug)]
struct Args {
    /// Use this database file instead of the one in the user data directory.
    #[arg(long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a user. Hashing the password is the caller's business; pass
    /// the finished hash.
    AddUser {
        username: String,
        email: String,
        #[arg(long, default_value = "")]
        password_hash: String,
    },
    /// Add a line to a user's ingredient inventory.
    AddIngredient {
        #[arg(long)]
        user: String,
        name: String,
        quantity: f64,
        #[arg(long, default_value = "pcs")]
        unit: String,
        #[arg(long)]
        notes: Option<String>,
    },
    ListIngredients {
        #[arg(long)]
        user: String,
    },
    /// Remove every inventory line with the given name.
    DeleteIngredient {
        #[arg(long)]
        user: String,
        name: String,
    },
    /// Import recipes from a JSON file.
    ImportRecipes { path: PathBuf },
    ListRecipes,
    /// Show the week's meal plan, generating and storing one if the week
    /// doesn't have one yet.
    Plan {
        #[arg(long)]
        user: String,
        /// Plan the week containing this date instead of today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Plan the week afresh and store the result as the week's newest plan.
    Regenerate {
        #[arg(long)]
        user: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Export the week's stored meal plan.
    ExportMealplan {
        #[arg(long)]
        user: String,
        format: ExportFormat,
        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export one recipe with its ingredient lines.
    ExportRecipe {
        id: i32,
        format: ExportFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// This is where the database lives on-disk. On Linux it should be like:
/// `~/.local/share/mealmatch/`
fn data_path() -> Result<PathBuf> {
    let dirs = directories::BaseDirs::new().expect("failed to get user home directory");
    let path = dirs.data_dir().join("mealmatch");
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

fn full_day_name(day: chrono::Weekday) -> &'static str {
    use chrono::Weekday::*;

    match day {
        Mon => "Monday",
        Tue => "Tuesday",
        Wed => "Wednesday",
        Thu => "Thursday",
        Fri => "Friday",
        Sat => "Saturday",
        Sun => "Sunday",
    }
}

fn user_named(conn: &mut database::Connection, name: &str) -> Result<database::models::User> {
    Ok(query::find_user(conn, name)?.ok_or_else(|| format!("no such user {name:?}"))?)
}

fn print_weekly_plan(weekly: &planner::WeeklyPlan) {
    println!(
        "Week of {} (generated {})",
        weekly.plan.week_start, weekly.generated_on
    );
    for entry in &weekly.plan.days {
        let date = weekly.plan.week_start + chrono::Days::new(u64::from(entry.day) - 1);
        let title = entry
            .title
            .as_deref()
            .unwrap_or(matcher::NO_SUITABLE_RECIPE);
        println!(
            "{:<10} {title} ({:.0}% match)",
            full_day_name(date.weekday()),
            entry.score * 100.0
        );
    }
    if !weekly.plan.candidates.is_empty() {
        println!("Considered:");
        for candidate in &weekly.plan.candidates {
            println!("  {} ({:.0}% match)", candidate.title, candidate.score * 100.0);
        }
    }
}

fn write_export(content: &str, out: Option<PathBuf>) -> Result<()> {
    match out {
        Some(path) => std::fs::write(path, content)?,
        None => print!("{content}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()?;

    let args = Args::parse();
    let database_path = match &args.database {
        Some(path) => path.clone(),
        None => data_path()?.join("data.sqlite"),
    };
    let mut conn = database::establish_connection(database_path)?;

    match args.commands {
        Commands::AddUser {
            username,
            email,
            password_hash,
        } => {
            query::add_user(&mut conn, &username, &email, &password_hash)?;
            println!("added user {username}");
        }
        Commands::AddIngredient {
            user,
            name,
            quantity,
            unit,
            notes,
        } => {
            let user = user_named(&mut conn, &user)?;
            query::add_ingredient(&mut conn, user.id, &name, quantity, &unit, notes.as_deref())?;
        }
        Commands::ListIngredients { user } => {
            let user = user_named(&mut conn, &user)?;
            for item in query::ingredients_for_user(&mut conn, user.id)? {
                let notes = item
                    .notes
                    .map(|n| format!(" ({n})"))
                    .unwrap_or_default();
                println!("{} {} {}{notes}", item.quantity, item.unit, item.name);
            }
        }
        Commands::DeleteIngredient { user, name } => {
            let user = user_named(&mut conn, &user)?;
            if !query::delete_ingredient(&mut conn, user.id, &name)? {
                return Err(format!("no ingredient named {name:?}").into());
            }
        }
        Commands::ImportRecipes { path } => import::import_recipes(conn, path)?,
        Commands::ListRecipes => {
            for (recipe, lines) in query::recipes_with_ingredients(&mut conn)? {
                println!("{}", recipe.title);
                for line in lines {
                    println!("  {} {} {}", line.required_quantity, line.unit, line.ingredient_name);
                }
            }
        }
        Commands::Plan { user, date } => {
            let user = user_named(&mut conn, &user)?;
            let today = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            let weekly = planner::weekly_plan_for(&mut conn, &user, today)?;
            print_weekly_plan(&weekly);
        }
        Commands::Regenerate { user, date } => {
            let user = user_named(&mut conn, &user)?;
            let today = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            let weekly = planner::regenerate(&mut conn, &user, today)?;
            print_weekly_plan(&weekly);
        }
        Commands::ExportMealplan { user, format, out } => {
            let user = user_named(&mut conn, &user)?;
            let week_start = planner::week_start_of(chrono::Local::now().date_naive());
            let stored = query::latest_mealplan_for_week(&mut conn, user.id, week_start)?
                .ok_or("no meal plan stored for this week yet; run `plan` first")?;
            let plan = matcher::Plan::from_stored(stored.week_start, &stored.plan_json)?;
            let content = match format {
                ExportFormat::Json => export::mealplan_json(&plan, stored.generated_on)?,
                ExportFormat::Csv => export::mealplan_csv(&plan),
            };
            write_export(&content, out)?;
        }
        Commands::ExportRecipe { id, format, out } => {
            let (recipe, lines) = query::recipe_with_ingredients(&mut conn, id)?
                .ok_or_else(|| format!("no recipe with id {id}"))?;
            let content = match format {
                ExportFormat::Json => export::recipe_json(&recipe, &lines)?,
                ExportFormat::Csv => export::recipe_csv(&recipe, &lines),
            };
            write_export(&content, out)?;
        }
    }
    Ok(())
}
