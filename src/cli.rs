use clap::{Parser, Subcommand};

use crate::commands;

#[derive(Parser)]
#[command(name = "priceforecast")]
#[command(about = "LSTM stock price forecast service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (defaults to PORT or 8000)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Train and forecast once, printing the result
    Forecast {
        /// Ticker symbol, e.g. AAPL
        #[arg(short, long)]
        ticker: String,
        /// First day of history (YYYY-MM-DD)
        #[arg(short, long)]
        start: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

pub async fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            commands::serve::run(port).await;
        }
        Commands::Forecast { ticker, start, json } => {
            commands::forecast::run(ticker, start, json).await;
        }
    }
}
