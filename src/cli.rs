use std::net::SocketAddr;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "askbot")]
#[command(author, version, about = "Relay questions to a chat completion API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Interactive question prompt (default)
    Chat,

    /// Ask a single question and print the answer
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Serve POST /ask and GET /health
    Serve {
        /// Overrides BIND_ADDR
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}
