pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "suite-gateway")]
#[command(about = "Authenticating gateway for the notes, whiteboard, tasks and PDF tools services")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Validate configuration and start the gateway")]
    Serve {
        #[arg(long, help = "Listen port (overrides PORT / GATEWAY_PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Print the route table")]
    Routes,

    #[command(about = "Mint a development token signed with JWT_SECRET")]
    Token {
        #[arg(long, help = "Subject id written to the `id` claim")]
        subject: String,
        #[arg(long, help = "Email claim")]
        email: Option<String>,
        #[arg(long, help = "Lifetime in hours (defaults to JWT_EXPIRY_HOURS)")]
        hours: Option<i64>,
    },

    #[command(about = "Validate configuration and print it with the secret redacted")]
    CheckConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = crate::config::config();

    match cli.command {
        Commands::Serve { port } => commands::serve::handle(config, port).await,
        Commands::Routes => commands::routes::handle(config, output_format),
        Commands::Token { subject, email, hours } => {
            commands::token::handle(config, &subject, email, hours, output_format)
        }
        Commands::CheckConfig => commands::check_config::handle(config, output_format),
    }
}
