use std::{
    io::{self, Write as _},
    time::Duration,
};

use camino::Utf8PathBuf;
use parley_client::{Client, Lifecycle, Submission, Submitter};
use parley_config::Config;
use tracing::{debug, info};

use crate::{
    cmd::Success,
    error::{Error, Result},
};

#[derive(Debug, clap::Args)]
pub(crate) struct Ask {
    /// The prompt to send.
    prompt: Option<String>,

    /// Attach a file.
    #[arg(short, long, value_name = "PATH")]
    file: Option<Utf8PathBuf>,

    /// MIME type of the attached file. Detected by the relay when omitted.
    #[arg(long, requires = "file")]
    mime_type: Option<String>,

    /// Base URL of the relay. Defaults to the configured server address.
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Continue an existing session.
    #[arg(long, value_name = "ID")]
    session: Option<String>,

    /// Print the reply as HTML.
    #[arg(long)]
    html: bool,

    /// Seconds to wait for the reply.
    #[arg(long, value_name = "SECS", default_value_t = 120)]
    timeout: u64,
}

impl Ask {
    pub(crate) async fn run(self, config: &Config) -> Result<Success> {
        let server = self
            .server
            .unwrap_or_else(|| format!("http://{}", config.server.socket_addr()));
        debug!(%server, "Using relay.");

        let mut client = Client::new(&server)?
            .with_session_header(&config.session.header_name)
            .with_timeout(Duration::from_secs(self.timeout))
            .with_max_bytes(u64::try_from(config.upload.max_bytes).unwrap_or(u64::MAX));

        if let Some(session) = self.session {
            client = client.with_session(session.parse()?);
        }

        let submitter = Submitter::new(client);
        submitter.submit(Submission {
            prompt: self.prompt,
            file: self.file,
            mime_type: self.mime_type,
        });

        let state = tokio::select! {
            state = submitter.wait() => state,
            _ = tokio::signal::ctrl_c() => {
                info!("Cancelling submission.");
                submitter.cancel();
                return Err(Error::Cancelled);
            }
        };

        let response = match state {
            Lifecycle::Succeeded { response, .. } => response,
            Lifecycle::Failed { error, .. } => return Err(Error::Client(error)),
            Lifecycle::Idle | Lifecycle::Submitting { .. } => return Err(Error::Cancelled),
        };

        writeln!(io::stderr(), "session: {}", response.session)?;

        let reply = response.result.last_reply().ok_or(Error::NoReply)?.text();
        if self.html {
            return Ok(parley_format::to_html(&reply).into());
        }

        Ok(reply.into())
    }
}
