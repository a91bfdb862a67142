use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use client_core::{FormKey, FormState, HttpLookupClient, KeyOutcome, LookupForm};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Look up an invitation letter by phone number.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    server_url: String,
    /// Search once for this number instead of reading numbers from stdin.
    #[arg(long)]
    phone: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let form = LookupForm::new(HttpLookupClient::new(args.server_url));

    if let Some(phone) = args.phone {
        let state = search_line(&form, &phone).await;
        render(&state);
        return Ok(if state.error.is_some() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"phone> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        render(&search_line(&form, &line).await);
    }

    Ok(ExitCode::SUCCESS)
}

/// Pastes `line` into the form and presses Enter, blank lines included.
async fn search_line(form: &LookupForm, line: &str) -> FormState {
    form.paste(line);
    let outcome = form.key_down(FormKey::Enter);
    if let KeyOutcome::Submitted(submission) = outcome {
        submission.wait().await;
    }
    let state = form.snapshot();
    debug!(
        phone_number = %state.phone_number,
        found = state.result.is_some(),
        error = state.error.as_deref(),
        "search finished"
    );
    state
}

fn render(state: &FormState) {
    if let Some(error) = &state.error {
        eprintln!("error: {error}");
        return;
    }
    let Some(record) = &state.result else {
        return;
    };
    println!("name:   {}", record.name);
    println!("email:  {}", record.email);
    println!("phone:  {}", record.phone_number);
    if let Some(link) = state.letter_link() {
        println!("letter: {link}");
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
