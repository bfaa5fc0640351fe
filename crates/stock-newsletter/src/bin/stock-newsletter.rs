//! Stock newsletter: web UI and one-shot research
//!
//! # Usage
//!
//! ```bash
//! export OPENAI_API_KEY="sk-..."
//!
//! # Web form on http://127.0.0.1:8501
//! cargo run --bin stock-newsletter -- serve
//!
//! # One newsletter on stdout
//! cargo run --bin stock-newsletter -- research AAPL
//! ```

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use stock_newsletter::web::{self, AppState};
use stock_newsletter::{NewsletterConfig, NewsletterCrew};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stock-newsletter")]
#[command(about = "Research a stock with a crew of LLM agents and write a newsletter", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web UI
    Serve {
        /// Address to listen on (overrides NEWSLETTER_BIND)
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },
    /// Research one ticker and print the newsletter
    Research {
        /// Ticker symbol, e.g. AAPL
        ticker: String,

        /// Print the whole crew output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    crew_utils::load_dotenv();
    let args = Args::parse();

    let mut config = NewsletterConfig::from_env().context("invalid configuration")?;
    crew_utils::init_tracing(config.verbose);

    match args.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            let addr = config.bind;
            let newsletter = Arc::new(NewsletterCrew::from_config(config)?);
            info!(%addr, "Starting web UI");
            web::serve(AppState::new(newsletter)?, addr).await?;
        }
        Command::Research { ticker, json } => {
            let newsletter = NewsletterCrew::from_config(config)?;
            let output = newsletter.research(&ticker).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{output}");
            }
        }
    }

    Ok(())
}
