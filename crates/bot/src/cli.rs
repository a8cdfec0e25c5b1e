use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "farmconnect")]
#[command(author, version, about = "Telegram ordering bot for the Osnabrück Farm Connect marketplace", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (long polling) together with the HTTP surface
    Run,

    /// Seed the database with a demo catalog
    Seed,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
