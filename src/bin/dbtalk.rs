//! dbtalk CLI: ask questions about a SQLite database.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use dbtalk::config::{Config, DiscoveryMode};
use dbtalk::database::SqliteDatabase;
use dbtalk::otel::init_tracing;
use dbtalk::router::QuestionRouter;
use dbtalk::schema::{CatalogIntrospector, SchemaDiscovery};
use dbtalk::types::ConversationState;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser)]
#[command(name = "dbtalk")]
#[command(about = "Ask natural-language questions about a SQLite database", long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, short, global = true, env = "DATABASE")]
    database: Option<String>,

    /// Model name (provider inferred from prefix)
    #[arg(long, short, global = true, env = "DBTALK_LLM")]
    model: Option<String>,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one question
    Ask {
        /// Question text
        question: String,

        /// Also print the classification and raw step results
        #[arg(long)]
        verbose: bool,
    },

    /// Interactive session; the schema is discovered once and reused
    Chat,

    /// Print the plan for a question without running it
    Plan {
        /// Question text
        question: String,
    },

    /// Discover and print the schema graph
    Schema {
        /// Print nodes and edges as JSON
        #[arg(long)]
        json: bool,
    },

    /// List tables and views (connectivity check)
    Tables,
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = Config::from_lookup(|key| match key {
        "DATABASE" => cli.database.clone(),
        "DBTALK_LLM" => cli.model.clone(),
        _ => std::env::var(key).ok(),
    })?;
    Ok(config)
}

fn print_answer(state: &ConversationState, verbose: bool) {
    if verbose {
        if let Some(input_type) = &state.input_type {
            println!("{} {}", "Input type:".dimmed(), input_type);
        }
        if let Some(results) = &state.db_results {
            println!("{}\n{}\n", "Step results:".dimmed(), results);
        }
    }
    println!("{}", state.response.as_deref().unwrap_or_default());
}

async fn chat(router: &QuestionRouter) -> anyhow::Result<()> {
    println!("{}", "Ask about your database. Empty line or Ctrl-D to quit.".cyan());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut state: Option<ConversationState> = None;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            break;
        }

        match router.respond(question, state.take()).await {
            Ok(answer) => {
                println!("{}\n", answer.response.as_deref().unwrap_or_default());
                state = Some(answer);
            }
            Err(e) => eprintln!("{} {}\n", "Error:".red(), e),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match &cli.command {
        Commands::Ask { question, verbose } => {
            let router = QuestionRouter::from_config(&load_config(&cli)?)?;
            let state = router.respond(question, None).await?;
            print_answer(&state, *verbose);
        }

        Commands::Chat => {
            let router = QuestionRouter::from_config(&load_config(&cli)?)?;
            chat(&router).await?;
        }

        Commands::Plan { question } => {
            let router = QuestionRouter::from_config(&load_config(&cli)?)?;
            println!("{}", "Plan:".bold());
            for (n, step) in router.plan(question).await.iter().enumerate() {
                println!("  {}. {}", n + 1, step);
            }
        }

        Commands::Schema { json } => {
            let config = load_config(&cli)?;
            let graph = match config.discovery {
                DiscoveryMode::Catalog => {
                    let introspector = CatalogIntrospector::from_config(&config)?;
                    Arc::new(SchemaDiscovery::new(Arc::new(introspector)).discover().await?)
                }
                DiscoveryMode::Llm => QuestionRouter::from_config(&config)?.schema().await?,
            };
            if *json {
                println!("{}", serde_json::to_string_pretty(&graph.export())?);
            } else {
                print!("{}", graph.summary());
            }
        }

        Commands::Tables => {
            let path = cli
                .database
                .as_deref()
                .context("--database or DATABASE is required")?;
            let path = shellexpand::tilde(path).into_owned();
            let db = SqliteDatabase::open(&path)?;
            let tables = db.show_tables().await?;
            println!("{} {}", "Connected to".green(), db.name().bold());
            print!("{}", tables.to_csv()?);
        }
    }

    Ok(())
}
