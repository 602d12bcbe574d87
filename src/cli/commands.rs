use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bullsai", version, about = "AI stock analysis assistant for Tata Power")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long, env = "BULLSAI_HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "BULLSAI_PORT", default_value = "8000")]
        port: u16,
    },
    /// Ask a single question and print the reply
    Ask {
        message: String,
        /// Conversation session id
        #[arg(long, default_value = "default")]
        session: String,
    },
    /// Print the current quote, ratios and analyst data
    Quote,
    /// Print historical OHLCV bars
    History {
        /// Provider period, e.g. 5d, 1mo, 1y
        #[arg(long, default_value = "1mo")]
        period: String,
        /// Provider interval, e.g. 1d, 1wk
        #[arg(long, default_value = "1d")]
        interval: String,
    },
    /// Show the intent flags computed for a query
    Classify { query: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["bullsai", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, "0.0.0.0");
                assert_eq!(port, 8000);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_history_args() {
        let cli = Cli::try_parse_from(["bullsai", "history", "--period", "1y", "--interval", "1wk"]).unwrap();
        match cli.command {
            Commands::History { period, interval } => {
                assert_eq!(period, "1y");
                assert_eq!(interval, "1wk");
            }
            _ => panic!("expected history"),
        }
    }

    #[test]
    fn test_ask_requires_message() {
        assert!(Cli::try_parse_from(["bullsai", "ask"]).is_err());
    }
}
