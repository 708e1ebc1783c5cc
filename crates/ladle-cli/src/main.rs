use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use ladle_core::{
    AppConfig, Database, ExitCode, Ingredient, Instruction, LadleError, Recipe, RecipeCard,
};
use ladle_dedup::{DedupError, DetectOptions, DetectionReport, ScanOptions};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "ladle",
    about = "Recipe manager with multi-signal duplicate detection",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts and automation).
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List recipes in the collection.
    List {
        #[arg(long, default_value = "50")]
        limit: usize,
        #[arg(long, default_value = "0")]
        offset: usize,
    },

    /// Search recipes by title.
    Search {
        query: String,
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show a recipe card by id.
    Show { id: String },

    /// Add a recipe, checking for duplicates first.
    Add {
        #[command(flatten)]
        recipe: RecipeArgs,

        /// Save even if likely duplicates are found.
        #[arg(long)]
        force: bool,
    },

    /// Check a candidate recipe for duplicates without saving it.
    Check {
        #[command(flatten)]
        recipe: RecipeArgs,

        /// Read the candidate from a JSON file instead of flags.
        #[arg(long, conflicts_with = "title")]
        file: Option<String>,

        /// Minimum score a match must reach to be reported.
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Soft-delete a recipe (restorable), or purge it permanently.
    Delete {
        id: String,
        /// Remove the row entirely instead of soft-deleting.
        #[arg(long)]
        purge: bool,
    },

    /// Restore a soft-deleted recipe.
    Restore { id: String },

    /// Duplicate management across the whole collection.
    Dedup {
        #[command(subcommand)]
        action: DedupAction,
    },

    /// Show collection statistics.
    Stats,

    /// Show version information.
    Version,
}

#[derive(Subcommand)]
enum DedupAction {
    /// Scan the collection for duplicate groups.
    Scan {
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        owner: Option<String>,
    },

    /// Merge duplicates: keep one recipe, soft-delete the rest.
    Merge {
        /// Id of the recipe to keep. Must be one of the listed ids.
        #[arg(long)]
        keep: String,

        /// Ids of all recipes in the duplicate set, keep included.
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Cheap title-based duplicate estimate.
    Stats {
        #[arg(long)]
        owner: Option<String>,
    },
}

/// Candidate-recipe fields shared by `add` and `check`.
#[derive(Args)]
struct RecipeArgs {
    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Ingredient as `name`, `name:quantity` or `name:quantity:unit`.
    /// Repeat for each ingredient.
    #[arg(long, action = clap::ArgAction::Append)]
    ingredient: Vec<String>,

    /// Preparation step, in order. Repeat for each step.
    #[arg(long, action = clap::ArgAction::Append)]
    step: Vec<String>,

    /// Total cooking time in minutes.
    #[arg(long)]
    time: Option<u32>,

    #[arg(long)]
    servings: Option<u32>,

    /// URL the recipe came from.
    #[arg(long)]
    source: Option<String>,

    /// Owner to file the recipe under (and to scope duplicate checks to).
    #[arg(long)]
    owner: Option<String>,

    #[arg(long)]
    vegetarian: bool,
    #[arg(long)]
    vegan: bool,
    #[arg(long)]
    gluten_free: bool,
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn open_db(config: &AppConfig) -> Result<Database> {
    let path = config.database_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Database::open(&path)?)
}

fn exit_with(code: ExitCode) -> ! {
    std::process::exit(code as i32)
}

fn parse_ingredient(raw: &str) -> Result<Ingredient> {
    let mut parts = raw.splitn(3, ':');
    let name = parts.next().unwrap_or_default().trim();
    if name.is_empty() {
        anyhow::bail!("ingredient name must not be empty: {raw:?}");
    }

    let mut ingredient = Ingredient::new(name);
    if let Some(quantity) = parts.next() {
        let quantity: f64 = quantity
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid quantity in ingredient {raw:?}"))?;
        ingredient.quantity = Some(quantity);
    }
    if let Some(unit) = parts.next() {
        ingredient.unit = Some(unit.trim().to_string());
    }
    Ok(ingredient)
}

fn build_candidate(args: &RecipeArgs) -> Result<Recipe> {
    let Some(title) = args.title.clone() else {
        eprintln!("A candidate recipe needs at least --title.");
        exit_with(ExitCode::InvalidArgs);
    };

    let mut recipe = Recipe::new(title);
    recipe.description = args.description.clone();
    recipe.cooking_time = args.time;
    recipe.servings = args.servings;
    recipe.source = args.source.clone();
    recipe.dietary.vegetarian = args.vegetarian;
    recipe.dietary.vegan = args.vegan;
    recipe.dietary.gluten_free = args.gluten_free;

    for raw in &args.ingredient {
        recipe.ingredients.push(parse_ingredient(raw)?);
    }
    for (index, text) in args.step.iter().enumerate() {
        recipe
            .instructions
            .push(Instruction::new(index as u32 + 1, text.clone()));
    }

    Ok(recipe)
}

fn load_candidate_file(path: &str) -> Result<Recipe> {
    let contents = std::fs::read_to_string(Path::new(path))?;
    Ok(serde_json::from_str(&contents)?)
}

fn print_report(report: &DetectionReport) {
    if !report.has_duplicates {
        println!("No duplicates found.");
        return;
    }

    println!(
        "Found {} likely duplicate(s), best score {:.2}:",
        report.total_duplicates, report.highest_score
    );
    for m in &report.duplicates {
        println!(
            "  {}  {:<24} {:.2}  ({})  {}",
            &m.recipe.id.to_string()[..8],
            m.match_type.to_string(),
            m.similarity_score,
            m.confidence,
            m.recipe.recipe.title
        );
    }
}

fn parse_uuid_arg(id: &str) -> Uuid {
    match Uuid::parse_str(id) {
        Ok(uuid) => uuid,
        Err(_) => {
            eprintln!("Invalid recipe id: {id}");
            exit_with(ExitCode::InvalidArgs);
        }
    }
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_output = cli.json || std::env::var("LADLE_JSON").is_ok_and(|v| v == "1");
    let config = AppConfig::load()?;
    let start = Instant::now();

    match cli.command {
        Commands::List { limit, offset } => {
            let db = open_db(&config)?;
            let recipes = db.list_recipes(limit, offset)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":recipes,"meta":{"duration_ms":dur}}))?;
            } else if recipes.is_empty() {
                println!("No recipes yet. Add one with `ladle add --title ...`.");
            } else {
                for r in &recipes {
                    let servings = r
                        .servings
                        .map(|s| format!("{s} servings"))
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "  {}  {:<40} {} ingredient(s), {}",
                        &r.id.to_string()[..8],
                        r.title,
                        r.ingredient_count,
                        servings
                    );
                }
            }
        }

        Commands::Search { query, limit } => {
            let db = open_db(&config)?;
            let results = db.search_recipes(&query, limit)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":results,"meta":{"duration_ms":dur}}))?;
            } else if results.is_empty() {
                println!("No results for: {query}");
            } else {
                println!("Found {} result(s):", results.len());
                for r in &results {
                    println!("  {}  {}", &r.id.to_string()[..8], r.title);
                }
            }
        }

        Commands::Show { id } => {
            let db = open_db(&config)?;
            let dur = start.elapsed().as_millis();
            match db.get_recipe(&id) {
                Ok(card) => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":card,"meta":{"duration_ms":dur}}))?;
                    } else {
                        println!("{}", serde_json::to_string_pretty(&card)?);
                    }
                }
                Err(LadleError::RecipeNotFound(_)) => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"error","error":"not_found","message":format!("Recipe {id} not found"),"meta":{"duration_ms":dur}}))?;
                    } else {
                        eprintln!("Recipe not found: {id}");
                    }
                    exit_with(ExitCode::NotFound);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Add { recipe, force } => {
            let owner = recipe.owner.clone().or(config.core.default_owner.clone());
            let candidate = build_candidate(&recipe)?;
            let db = open_db(&config)?;

            let options = DetectOptions::default()
                .with_threshold(config.dedup.similarity_threshold);
            let report =
                ladle_dedup::check_recipe(&db, &candidate, owner.as_deref(), &options)?;

            if report.has_duplicates && !force {
                let dur = start.elapsed().as_millis();
                if json_output {
                    print_json(&serde_json::json!({"status":"error","error":"duplicates_found","data":report,"meta":{"duration_ms":dur}}))?;
                } else {
                    print_report(&report);
                    eprintln!("Not saved. Re-run with --force to save anyway.");
                }
                exit_with(ExitCode::Conflict);
            }

            let mut card = RecipeCard::new(candidate);
            if let Some(owner) = owner {
                card = card.with_owner(owner);
            }
            db.upsert_recipe(&card)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":card,"meta":{"duration_ms":dur}}))?;
            } else {
                println!("Added: {} ({})", card.recipe.title, card.id);
            }
        }

        Commands::Check {
            recipe,
            file,
            threshold,
        } => {
            let owner = recipe.owner.clone().or(config.core.default_owner.clone());
            let candidate = match file {
                Some(path) => load_candidate_file(&path)?,
                None => build_candidate(&recipe)?,
            };

            let db = open_db(&config)?;
            let options = DetectOptions::default()
                .with_threshold(threshold.unwrap_or(config.dedup.similarity_threshold));
            let report =
                ladle_dedup::check_recipe(&db, &candidate, owner.as_deref(), &options)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":report,"meta":{"duration_ms":dur}}))?;
            } else {
                print_report(&report);
            }
        }

        Commands::Delete { id, purge } => {
            let db = open_db(&config)?;
            let result = if purge {
                db.purge_recipe(&id).map(|_| None)
            } else {
                db.soft_delete_recipe(&id).map(Some)
            };
            let dur = start.elapsed().as_millis();

            match result {
                Ok(_) => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":{"deleted":id,"purged":purge},"meta":{"duration_ms":dur}}))?;
                    } else if purge {
                        println!("Purged recipe: {id}");
                    } else {
                        println!("Deleted recipe: {id} (restore with `ladle restore {id}`)");
                    }
                }
                Err(LadleError::RecipeNotFound(_)) => {
                    eprintln!("Recipe not found: {id}");
                    exit_with(ExitCode::NotFound);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Restore { id } => {
            let db = open_db(&config)?;
            match db.restore_recipe(&id) {
                Ok(card) => {
                    let dur = start.elapsed().as_millis();
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":card,"meta":{"duration_ms":dur}}))?;
                    } else {
                        println!("Restored: {}", card.recipe.title);
                    }
                }
                Err(LadleError::RecipeNotFound(_)) => {
                    eprintln!("Recipe not found: {id}");
                    exit_with(ExitCode::NotFound);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Dedup { action } => match action {
            DedupAction::Scan {
                threshold,
                limit,
                owner,
            } => {
                let db = open_db(&config)?;
                let options = ScanOptions {
                    similarity_threshold: threshold.unwrap_or(config.dedup.scan_threshold),
                    limit: limit.unwrap_or(config.dedup.scan_limit),
                };
                let groups = ladle_dedup::find_all_duplicates(&db, owner.as_deref(), &options)?;
                let count = groups.len();
                let dur = start.elapsed().as_millis();

                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":{"groups":groups,"count":count},"meta":{"duration_ms":dur}}))?;
                } else if groups.is_empty() {
                    println!("No duplicate groups found.");
                } else {
                    println!("Found {} duplicate group(s):", groups.len());
                    for (index, group) in groups.iter().enumerate() {
                        println!(
                            "Group {} — {} via {} (score {:.2})",
                            index + 1,
                            group.recipes.len(),
                            group.match_type,
                            group.similarity_score
                        );
                        for card in &group.recipes {
                            println!(
                                "    {}  {}",
                                &card.id.to_string()[..8],
                                card.recipe.title
                            );
                        }
                    }
                }
            }

            DedupAction::Merge { keep, ids } => {
                let db = open_db(&config)?;
                let keep_id = parse_uuid_arg(&keep);
                let ids: Vec<Uuid> = ids.iter().map(|id| parse_uuid_arg(id)).collect();

                match ladle_dedup::merge_duplicates(&db, &ids, &keep_id) {
                    Ok(outcome) => {
                        let dur = start.elapsed().as_millis();
                        if json_output {
                            print_json(&serde_json::json!({"status":"ok","data":outcome,"meta":{"duration_ms":dur}}))?;
                        } else {
                            println!(
                                "Kept {} ({}), soft-deleted {} recipe(s).",
                                outcome.kept.recipe.title,
                                outcome.kept.id,
                                outcome.deleted.len()
                            );
                        }
                    }
                    Err(DedupError::InvalidMerge(message)) => {
                        eprintln!("Invalid merge: {message}");
                        exit_with(ExitCode::InvalidArgs);
                    }
                    Err(DedupError::RecipeNotFound(id)) => {
                        eprintln!("Recipe not found: {id}");
                        exit_with(ExitCode::NotFound);
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            DedupAction::Stats { owner } => {
                let db = open_db(&config)?;
                let stats = ladle_dedup::collection_stats(&db, owner.as_deref())?;
                let dur = start.elapsed().as_millis();

                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":stats,"meta":{"duration_ms":dur}}))?;
                } else {
                    println!("Recipes:              {}", stats.total_recipes);
                    println!("Potential duplicates: {}", stats.potential_duplicates);
                    println!("Duplicate rate:       {:.1}%", stats.duplicate_percentage);
                }
            }
        },

        Commands::Stats => {
            let db = open_db(&config)?;
            let active = db.count_recipes()?;
            let deleted = db.count_deleted_recipes()?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"recipes":active,"deleted":deleted},"meta":{"duration_ms":dur}}))?;
            } else {
                println!("Recipes: {active} active, {deleted} soft-deleted");
                println!("Database: {}", config.database_path().display());
            }
        }

        Commands::Version => {
            let version = env!("CARGO_PKG_VERSION");
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"version":version}}))?;
            } else {
                println!("ladle {version}");
            }
        }
    }

    Ok(())
}
