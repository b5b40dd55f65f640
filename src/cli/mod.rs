//! bball-oracle CLI
//!
//! Commands:
//! - `bball-oracle serve` - Run the HTTP API (default)
//! - `bball-oracle ask` - Answer one question and exit
//! - `bball-oracle check` - Run a query through the sanitizer only
//! - `bball-oracle sql` - Sanitize and execute a query, print the rows

pub mod output;

use clap::{Parser, Subcommand};

pub use output::{print_result, OutputMode};

/// Natural-language questions over NBA play-by-play data
#[derive(Parser, Debug)]
#[command(name = "bball-oracle")]
#[command(author, version, about = "Answer basketball statistics questions in plain language")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config directory (default.toml, <ORACLE_ENV>.toml)
    #[arg(short, long, default_value = "config", env = "ORACLE_CONFIG_DIR")]
    pub config: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Override server.port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Answer a single question and exit
    Ask {
        /// The question, in plain language
        question: String,
    },
    /// Check a query against the sanitizer without touching the database
    Check {
        /// Query text
        sql: String,
    },
    /// Sanitize and execute a query, printing the rows
    Sql {
        /// Query text
        sql: String,
        /// Output as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn subcommand(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Serve { port: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::try_parse_from(["bball-oracle"]).unwrap();
        assert!(matches!(cli.subcommand(), Commands::Serve { port: None }));
        assert_eq!(cli.config, "config");
    }

    #[test]
    fn parses_ask() {
        let cli = Cli::try_parse_from(["bball-oracle", "ask", "Who scored the most points?"]).unwrap();
        match cli.subcommand() {
            Commands::Ask { question } => assert_eq!(question, "Who scored the most points?"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_sql_json_flag() {
        let cli = Cli::try_parse_from(["bball-oracle", "sql", "--json", "SELECT 1"]).unwrap();
        match cli.subcommand() {
            Commands::Sql { sql, json } => {
                assert_eq!(sql, "SELECT 1");
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
