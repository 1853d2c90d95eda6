use deposit_insurance_assistant::{
    config::AssistantConfig,
    pipeline::Assistant,
};
use std::io::{self, BufRead, Write};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let config = AssistantConfig::from_env()?;
    info!(mode = ?config.mode, "Deposit-insurance assistant starting");

    let assistant = Assistant::new(config)?;

    // Question from argv, or an interactive stdin loop.
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        let question = args.join(" ");
        answer(&assistant, &question).await;
        return Ok(());
    }

    println!("Postavite pitanje o osiguranju depozita (Ctrl-D za kraj):");
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }

        answer(&assistant, question).await;
    }

    Ok(())
}

async fn answer(assistant: &Assistant, question: &str) {
    let result = assistant.process(question).await;

    println!("\n{}", result.response);
    println!(
        "\n[{} | {} ({:.0}%) | akcija: {}]",
        result.request_id,
        result.intent,
        result.confidence * 100.0,
        result.action
    );
}
