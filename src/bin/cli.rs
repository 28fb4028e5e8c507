use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use sqlx::PgPool;

use lms::cli::seeder::{SeedConfig, clear_seeded_data, seed_database};
use lms::cli::{create_admin, generate_api_key};
use lms_db::{init_db_pool, run_migrations};

#[derive(Parser)]
#[command(name = "lms-cli")]
#[command(about = "LMS CLI - Administrative tools for the LMS API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator account
    CreateAdmin {
        /// External id used to log in
        #[arg(short = 'e', long)]
        external_id: Option<String>,

        /// Display name
        #[arg(short = 'n', long)]
        full_name: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Issue an API key for an existing user
    GenerateApiKey {
        #[arg(short = 'e', long)]
        external_id: String,

        /// Label shown in the key list
        #[arg(short = 'n', long, default_value = "CLI key")]
        name: String,
    },
    /// Run pending database migrations
    Migrate,
    /// Seed the database with fake courses and students
    Seed {
        #[arg(short = 'c', long, default_value = "10")]
        courses: usize,

        #[arg(long, default_value = "2")]
        instances: usize,

        #[arg(short = 's', long, default_value = "200")]
        students: usize,

        /// Instances each student is enrolled in
        #[arg(long, default_value = "3")]
        enrollments: usize,
    },
    /// Remove all seeded courses and students
    ClearSeed,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    let pool = match init_db_pool().await {
        Ok(pool) => pool,
        Err(e) => fail("Failed to connect to database", e),
    };

    match cli.command {
        Commands::CreateAdmin {
            external_id,
            full_name,
            password,
        } => handle_create_admin(&pool, external_id, full_name, password).await,
        Commands::GenerateApiKey { external_id, name } => {
            handle_generate_api_key(&pool, &external_id, &name).await
        }
        Commands::Migrate => match run_migrations(&pool).await {
            Ok(()) => println!("✅ Migrations applied"),
            Err(e) => fail("Error running migrations", e),
        },
        Commands::Seed {
            courses,
            instances,
            students,
            enrollments,
        } => {
            let config = SeedConfig {
                courses,
                instances_per_course: instances,
                students,
                enrollments_per_student: enrollments,
            };
            if let Err(e) = seed_database(&pool, config).await {
                fail("Error seeding database", e);
            }
        }
        Commands::ClearSeed => {
            if let Err(e) = clear_seeded_data(&pool).await {
                fail("Error clearing seeded data", e);
            }
        }
    }
}

fn fail(context: &str, error: impl std::fmt::Display) -> ! {
    eprintln!("\n❌ {}: {}", context, error);
    std::process::exit(1);
}

fn prompt(label: &str) -> String {
    Input::new()
        .with_prompt(label)
        .interact_text()
        .unwrap_or_else(|e| fail("Failed to read input", e))
}

async fn handle_create_admin(
    pool: &PgPool,
    external_id: Option<String>,
    full_name: Option<String>,
    password: Option<String>,
) {
    let external_id = external_id.unwrap_or_else(|| prompt("External ID"));
    let full_name = full_name.unwrap_or_else(|| prompt("Full name"));
    let password = password.unwrap_or_else(|| {
        Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()
            .unwrap_or_else(|e| fail("Failed to read password", e))
    });

    match create_admin(pool, &external_id, &full_name, &password).await {
        Ok(user) => {
            println!("\n✅ Admin created successfully!");
            println!("   External ID: {}", user.external_id);
            println!("   Name: {}", user.full_name);
        }
        Err(e) => fail("Error creating admin", e),
    }
}

async fn handle_generate_api_key(pool: &PgPool, external_id: &str, name: &str) {
    match generate_api_key(pool, external_id, name).await {
        Ok(key) => {
            println!("\n✅ API key generated. It will not be shown again:");
            println!("   {}", key);
        }
        Err(e) => fail("Error generating API key", e),
    }
}
