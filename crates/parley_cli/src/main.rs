use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    parley_cli::run().await
}
