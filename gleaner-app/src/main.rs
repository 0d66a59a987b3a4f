use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gleaner_common::PipelineResult;
use gleaner_common::observability::{LogConfig, LogFormat, init_logging};
use gleaner_config::{GleanerConfig, GleanerConfigLoader};
use gleaner_runtime::GleanerRuntime;
use gleaner_web::{CurrencyPair, FetchTarget, Intent, Pipeline};
use serde::Serialize;

mod chat;

use chat::ChatRouter;

#[derive(Debug, Parser)]
#[command(name = "gleaner", version, about = "Acquire pages, search the web and mine exchange rates")]
struct Cli {
    /// YAML configuration file; defaults to ./gleaner.yaml then the user config dir.
    #[arg(long, short, env = "GLEANER_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch one page and extract its content.
    Acquire {
        url: String,
        #[arg(long, default_value_t = Intent::Summarize)]
        intent: Intent,
    },
    /// Search and extract every result.
    Search {
        #[arg(required = true)]
        query: Vec<String>,
        /// Number of results (1-10); defaults to `search.default_results`.
        #[arg(short = 'n', long)]
        results: Option<usize>,
    },
    /// Look up the current exchange rate for a currency pair.
    Rate {
        #[arg(long, default_value = "USD")]
        base: String,
        #[arg(long, default_value = "IDR")]
        quote: String,
    },
    /// Answer a chat message the way the chat service would.
    Chat {
        #[arg(required = true)]
        message: Vec<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<GleanerConfig> {
    let loader = match path {
        Some(p) => GleanerConfigLoader::new().with_file(p),
        None => GleanerConfigLoader::new().with_default_files(),
    };
    loader.load().context("failed to load configuration")
}

fn log_config(config: &GleanerConfig) -> LogConfig {
    LogConfig {
        app_name: "gleaner",
        log_dir: config.logging.dir.as_ref().map(PathBuf::from),
        emit_stderr: config.logging.stderr,
        format: LogFormat::from_name(&config.logging.format),
        default_filter: config.logging.filter.clone(),
    }
}

fn print<T: Serialize>(result: &PipelineResult<T>) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run(command: Command, pipeline: Pipeline) -> Result<ExitCode> {
    match command {
        Command::Acquire { url, intent } => {
            let res = pipeline
                .acquire_target(FetchTarget::new(url).with_intent(intent))
                .await;
            print(&res)
        }
        Command::Search { query, results } => {
            let n = results.unwrap_or(pipeline.default_results());
            let res = pipeline.search(&query.join(" "), n).await;
            print(&res)
        }
        Command::Rate { base, quote } => {
            let pair = CurrencyPair::from_codes(&base, &quote);
            if pair.base == pair.quote {
                anyhow::bail!("base and quote must differ, got {}", pair.base.code);
            }
            let res = ChatRouter::new(pipeline).exchange_rate(&pair).await?;
            print(&res)
        }
        Command::Chat { message } => {
            let res = ChatRouter::new(pipeline).handle(&message.join(" ")).await?;
            print(&res)
        }
    }
}

fn main() -> Result<ExitCode> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    let log_path = init_logging(log_config(&config))?;
    tracing::info!(log = %log_path.display(), config = ?config, "app.start");

    let runtime = GleanerRuntime::build("gleaner-worker", None)?;
    runtime.cancel_on_ctrl_c();

    let pipeline = Pipeline::from_config(&config)?.with_cancellation(runtime.handle().cancellation());
    let outcome = runtime.block_on(run(cli.command, pipeline));

    runtime.shutdown(Duration::from_secs(1));
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use gleaner_web::fact::Currency;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::parse_from(["gleaner", "acquire", "https://a.example", "--intent", "extract"]);
        match cli.command {
            Command::Acquire { url, intent } => {
                assert_eq!(url, "https://a.example");
                assert_eq!(intent, Intent::Extract);
            }
            other => panic!("unexpected {other:?}"),
        }

        let cli = Cli::parse_from(["gleaner", "search", "usd", "idr", "-n", "3"]);
        assert!(matches!(
            cli.command,
            Command::Search { ref query, results: Some(3) } if query.join(" ") == "usd idr"
        ));
    }

    #[test]
    fn logging_follows_config() {
        let mut config = GleanerConfig::default();
        config.logging.format = "json".into();
        config.logging.stderr = true;
        let log = log_config(&config);
        assert_eq!(log.format, LogFormat::Json);
        assert!(log.emit_stderr);
        assert_eq!(log.default_filter, "info");
    }

    #[test]
    fn rate_pair_uses_known_names() {
        let pair = CurrencyPair::from_codes("usd", "idr");
        assert_eq!(pair, CurrencyPair::default());
        assert_eq!(CurrencyPair::from_codes("sgd", "idr").base, Currency::new("SGD"));
    }
}
