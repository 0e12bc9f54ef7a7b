mod ask;
mod format;
mod serve;

use parley_config::Config;

use crate::error::Result;

#[derive(Debug, clap::Subcommand)]
pub(crate) enum Commands {
    /// Run the relay server.
    Serve(serve::Serve),

    /// Send a prompt or file to a running relay.
    #[command(visible_alias = "a")]
    Ask(ask::Ask),

    /// Render chat markup as HTML.
    #[command(visible_alias = "fmt")]
    Format(format::Format),
}

impl Commands {
    pub(crate) async fn run(self, config: &Config) -> Result<Success> {
        match self {
            Commands::Serve(args) => args.run(config).await,
            Commands::Ask(args) => args.run(config).await,
            Commands::Format(args) => args.run(),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Commands::Serve(_) => "serve",
            Commands::Ask(_) => "ask",
            Commands::Format(_) => "format",
        }
    }
}

/// The type of output that should be printed to the screen.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Success {
    /// The command was successful.
    Ok,

    /// Single message to be printed to the screen.
    Message(String),
}

impl From<()> for Success {
    fn from(_value: ()) -> Self {
        Self::Ok
    }
}

impl From<String> for Success {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
