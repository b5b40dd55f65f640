use bball_oracle::adapters::{start_api_server, PostgresStore};
use bball_oracle::agent::OpenAiClient;
use bball_oracle::api::AppState;
use bball_oracle::cli::{print_result, Cli, Commands, OutputMode};
use bball_oracle::config::AppConfig;
use bball_oracle::error::{OracleError, Result};
use bball_oracle::pipeline::{run_checked, QueryPipeline, QuerySanitizer};
use bball_oracle::schema::SchemaDescription;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

mod main_runtime;

use main_runtime::{init_logging, init_logging_simple};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;

    match cli.subcommand() {
        Commands::Check { sql } => {
            init_logging_simple();
            let sanitizer = QuerySanitizer::new(config.pipeline.max_query_chars);
            match sanitizer.check(&sql) {
                Ok(()) => println!("\x1b[32m✓ accepted\x1b[0m"),
                Err(rejection) => {
                    println!("\x1b[31m✗ rejected: {}\x1b[0m", rejection);
                    std::process::exit(1);
                }
            }
        }
        Commands::Sql { sql, json } => {
            init_logging_simple();
            require_valid(&config, false)?;
            let store = PostgresStore::new(&config.database).await?;
            let sanitizer = QuerySanitizer::new(config.pipeline.max_query_chars);
            let (_, result) = run_checked(&sanitizer, &store, &sql).await?;
            print_result(&result, OutputMode::from_json_flag(json))
                .map_err(OracleError::Other)?;
        }
        Commands::Ask { question } => {
            init_logging_simple();
            require_valid(&config, true)?;
            let (pipeline, _) = build_pipeline(&config).await?;
            match pipeline.answer(&question).await {
                Ok(answer) => println!("{}", answer),
                Err(e) => {
                    eprintln!("{}", e.public_message());
                    std::process::exit(1);
                }
            }
        }
        Commands::Serve { port } => {
            init_logging(&config.logging);
            require_valid(&config, true)?;
            let (pipeline, store) = build_pipeline(&config).await?;
            let state = AppState::new(Arc::new(pipeline), Some(store));
            let port = port.unwrap_or(config.server.port);
            start_api_server(state, &config.server.host, port).await?;
        }
    }

    Ok(())
}

/// Fail fast on configuration problems, reporting all of them at once
fn require_valid(config: &AppConfig, needs_model: bool) -> Result<()> {
    let problems: Vec<String> = match config.validate() {
        Ok(()) => Vec::new(),
        Err(problems) => problems
            .into_iter()
            .filter(|p| needs_model || !p.starts_with("llm."))
            .collect(),
    };

    if problems.is_empty() {
        return Ok(());
    }
    for problem in &problems {
        error!("Configuration: {}", problem);
    }
    Err(OracleError::Configuration(problems.join("; ")))
}

async fn build_pipeline(config: &AppConfig) -> Result<(QueryPipeline, PostgresStore)> {
    let schema = SchemaDescription::load(&config.schema.path)?;
    let store = PostgresStore::new(&config.database).await?;
    let llm = OpenAiClient::new(config.llm.clone())?;
    info!(
        "Pipeline ready (model {}, season {})",
        llm.model(),
        config.pipeline.current_season
    );

    let pipeline = QueryPipeline::new(
        schema,
        Arc::new(llm),
        Arc::new(store.clone()),
        &config.pipeline,
    );
    Ok((pipeline, store))
}
