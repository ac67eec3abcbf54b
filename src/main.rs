use display_error_chain::DisplayErrorChain;
use gemini_describe::{runner, Gemini, RunnerConfig};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = RunnerConfig::default();
    let mut stdout = std::io::stdout().lock();

    match runner::run(&config, Gemini::from_env, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "run failed");
            eprintln!("error: {}", DisplayErrorChain::new(&error));
            ExitCode::FAILURE
        }
    }
}
