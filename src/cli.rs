use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "artifact-atlas",
    about = "Collect museum artifact records into SQLite and explore them"
)]
pub struct Cli {
    /// Path to the SQLite database
    #[arg(long, global = true, default_value = "~/.artifact-atlas/artifacts.db")]
    pub db_path: String,

    /// Harvard Art Museums API key.
    /// WARNING: passing via --api-key is visible in process listings.
    /// Prefer the HAM_API_KEY environment variable instead.
    #[arg(long, global = true, env = "HAM_API_KEY")]
    pub api_key: Option<String>,

    /// Base URL of the object endpoint
    #[arg(long, global = true, default_value = crate::api::DEFAULT_BASE_URL)]
    pub api_base_url: String,

    /// Log level
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch records for a classification and load them into the store
    Collect(CollectArgs),
    /// Run one query from the catalog
    Query(QueryArgs),
    /// List the query catalog
    Queries,
    /// Show what the store currently holds
    Status(StatusArgs),
    /// Remove every artifact of one classification
    Delete(DeleteArgs),
    /// Delete the database file
    ResetDb(ResetDbArgs),
}

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Classification to fetch, e.g. "Coins"
    pub classification: String,

    /// Stop after this many records even if the API has more
    #[arg(long, default_value_t = 2500)]
    pub max_records: u64,

    /// Records requested per API page
    #[arg(long, default_value_t = 100)]
    pub page_size: u32,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Query name, e.g. "count-per-culture"
    pub name: String,

    /// Query parameter as name=value; repeat for multiple parameters
    #[arg(short = 'p', long = "param", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,

    /// Show at most this many rows
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Also list recent collect runs
    #[arg(long)]
    pub runs: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Classification whose artifacts should be removed
    pub classification: String,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct ResetDbArgs {
    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Parse a `name=value` command line pair.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_collect() {
        let cli = Cli::try_parse_from([
            "artifact-atlas",
            "collect",
            "Coins",
            "--max-records",
            "500",
        ])
        .unwrap();
        match cli.command {
            Command::Collect(args) => {
                assert_eq!(args.classification, "Coins");
                assert_eq!(args.max_records, 500);
                assert_eq!(args.page_size, 100);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_query_with_params() {
        let cli = Cli::try_parse_from([
            "artifact-atlas",
            "query",
            "by-period",
            "-p",
            "period=Archaic",
            "--limit",
            "5",
        ])
        .unwrap();
        match cli.command {
            Command::Query(args) => {
                assert_eq!(args.name, "by-period");
                assert_eq!(
                    args.params,
                    vec![("period".to_string(), "Archaic".to_string())]
                );
                assert_eq!(args.limit, Some(5));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_param_without_equals_rejected() {
        let result = Cli::try_parse_from(["artifact-atlas", "query", "by-period", "-p", "period"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_param_value_may_contain_equals() {
        assert_eq!(
            parse_key_val("credit=Gift of J=K").unwrap(),
            ("credit".to_string(), "Gift of J=K".to_string())
        );
    }
}
