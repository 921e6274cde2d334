use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::PgPool;

use catalog_api_rust::config::AppConfig;
use catalog_api_rust::database::{self, repos};

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Catalog CLI - schema bootstrap and sample data for the Catalog API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Create the catalog schema (idempotent)")]
    InitDb,

    #[command(about = "Reset catalog tables and fill them with sample data")]
    Populate {
        #[arg(long, default_value_t = 5)]
        categories: usize,

        #[arg(long, default_value_t = 10)]
        subcategories: usize,

        #[arg(long, default_value_t = 50)]
        products: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let pool = database::connect(&config)
        .await
        .context("failed to connect to database")?;

    match cli.command {
        Commands::InitDb => {
            database::apply_schema(&pool).await?;
            println!("schema applied");
        }
        Commands::Populate {
            categories,
            subcategories,
            products,
        } => {
            database::apply_schema(&pool).await?;
            populate(&pool, categories, subcategories, products).await?;
            println!(
                "db populated! ({} categories, {} subcategories, {} products)",
                categories, subcategories, products
            );
        }
    }

    Ok(())
}

/// Counterpart of the usual seed script: wipes the catalog tables and
/// refills them with deterministic sample data and links.
async fn populate(
    pool: &PgPool,
    category_count: usize,
    subcategory_count: usize,
    product_count: usize,
) -> anyhow::Result<()> {
    sqlx::query("TRUNCATE category, subcategory, product RESTART IDENTITY CASCADE")
        .execute(pool)
        .await?;

    let mut tx = pool.begin().await?;

    let mut category_ids = Vec::with_capacity(category_count);
    for i in 1..=category_count {
        let category = repos::categories::insert(&mut tx, &format!("Sample Category {i}")).await?;
        category_ids.push(category.id);
    }

    let mut subcategory_ids = Vec::with_capacity(subcategory_count);
    for i in 1..=subcategory_count {
        let subcategory =
            repos::subcategories::insert(&mut tx, &format!("Sample Subcategory {i}")).await?;
        if !category_ids.is_empty() {
            let parent = category_ids[(i - 1) % category_ids.len()];
            repos::subcategories::link_categories(&mut tx, subcategory.id, &[parent]).await?;
        }
        subcategory_ids.push(subcategory.id);
    }

    for i in 1..=product_count {
        let product = repos::products::insert(
            &mut tx,
            &format!("Sample Product {i}"),
            Some(&format!("Description for sample product {i}")),
        )
        .await?;
        if !subcategory_ids.is_empty() {
            // Spread products over subcategories, some in two
            let first = subcategory_ids[(i - 1) % subcategory_ids.len()];
            repos::products::link_subcategories(&mut tx, product.id, &[first]).await?;
            let second = subcategory_ids[(i * 3 + 1) % subcategory_ids.len()];
            if second != first {
                repos::products::link_subcategories(&mut tx, product.id, &[second]).await?;
            }
        }
    }

    tx.commit().await?;
    Ok(())
}
