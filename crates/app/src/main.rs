use std::process::ExitCode;

use client::RestBackend;
use commands::Outcome;
use engine::{QueryCache, TransactionFlow};
use prompt::Console;
use settings::Command;

mod commands;
mod error;
mod prompt;
mod settings;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::Cancelled) => ExitCode::from(2),
        Ok(Outcome::Failed) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> error::Result<Outcome> {
    let (settings, command) = settings::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "bonifico={level},engine={level},client={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let session = settings.session()?;
    let backend = RestBackend::builder()
        .base_url(&settings.backend.base_url)
        .timeout(settings.backend.timeout())
        .build()?;
    tracing::info!("Signed in as {}", session.user());

    let cache = QueryCache::default();
    let mut flow = TransactionFlow::new(backend, cache.clone(), session);
    let mut console = Console::stderr();

    let intent = match &command {
        Command::Balance(args) => {
            return commands::balance(&flow, &cache, &mut console, &args.account).await;
        }
        Command::Transfer(args) => commands::transfer_intent(args),
        Command::Mass(args) => commands::mass_intent(args),
        Command::Pay(args) => commands::payment_intent(args),
    };
    let intent = match intent {
        Ok(intent) => intent,
        Err(err) => {
            console.notice(&engine::Notice::error(err.to_string()))?;
            return Ok(Outcome::Failed);
        }
    };

    commands::run_movement(&mut flow, &cache, &mut console, intent).await
}
