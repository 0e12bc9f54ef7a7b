use parley_config::Config;

use crate::{cmd::Success, error::Result};

#[derive(Debug, clap::Args)]
pub(crate) struct Serve {
    /// Port to listen on, instead of `server.port`.
    #[arg(short, long)]
    port: Option<u16>,
}

impl Serve {
    pub(crate) async fn run(&self, config: &Config) -> Result<Success> {
        parley_relay::serve(&self.apply(config)).await?;
        Ok(().into())
    }

    fn apply(&self, config: &Config) -> Config {
        let mut config = config.clone();
        if let Some(port) = self.port {
            config.server.port = port;
        }

        config
    }
}
