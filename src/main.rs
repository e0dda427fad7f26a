//! Interactive Titan CLI.
//!
//! Usage:
//!   titan
//!   titan --model llama3.2:latest --base-url http://localhost:11434
//!   titan --list-models
//!
//! Ctrl-C, end-of-input, or typing "exit" / "quit" leaves the loop.

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use titan::llm::{ChatGateway, OllamaGateway};
use titan::tools::Toolbox;
use titan::{TitanAgent, ToolConfig};

#[derive(Parser)]
#[command(name = "titan", about = "Chat with a local Ollama model, with lookup tools")]
struct Cli {
    /// Ollama model name
    #[arg(long, default_value = "llama3.2:latest")]
    model: String,

    /// Ollama base URL
    #[arg(long, default_value = "http://localhost:11434")]
    base_url: String,

    /// List available Ollama models and exit
    #[arg(long)]
    list_models: bool,
}

const BANNER: &str = r"
████████╗██╗████████╗ █████╗ ███╗   ██╗
╚══██╔══╝██║╚══██╔══╝██╔══██╗████╗  ██║
   ██║   ██║   ██║   ███████║██╔██╗ ██║
   ██║   ██║   ██║   ██╔══██║██║╚██╗██║
   ██║   ██║   ██║   ██║  ██║██║ ╚████║
   ╚═╝   ╚═╝   ╚═╝   ╚═╝  ╚═╝╚═╝  ╚═══╝
";

#[tokio::main]
async fn main() -> titan::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let gateway = Arc::new(OllamaGateway::with_host(&cli.base_url));

    if cli.list_models {
        match gateway.available_models().await {
            Ok(models) => {
                println!("Available Ollama models:");
                for model in models {
                    println!("  - {}", model);
                }
            }
            Err(e) => {
                eprintln!("Could not retrieve models from Ollama: {}", e);
            }
        }
        return Ok(());
    }

    let agent = TitanAgent::new(&cli.model, gateway, Toolbox::new(ToolConfig::from_env()));

    println!("{}", BANNER);
    println!("Chat with {} running locally via Ollama.", cli.model);
    println!("Type 'exit' to quit.");

    let (connected, status) = agent.check_connection().await;
    println!("{}", status);

    if !connected {
        println!();
        println!("To start Ollama, run: ollama serve");
        println!("To pull the model, run: ollama pull {}", cli.model);
        return Ok(());
    }

    println!();
    println!("{}", "=".repeat(50));

    loop {
        print!("\nYou: ");
        io::stdout().flush()?;

        let input = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nGoodbye!");
                // a blocking stdin read may still be pending; leave directly
                std::process::exit(0);
            }
            line = tokio::task::spawn_blocking(read_line) => match line {
                Ok(Ok(Some(line))) => line,
                // end-of-input or a broken stdin both end the session
                _ => {
                    println!("\nGoodbye!");
                    break;
                }
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "exit" | "quit") {
            println!("Goodbye!");
            break;
        }

        match agent.respond(input).await {
            Ok(answer) => println!("Titan: {}", answer),
            Err(e) => eprintln!("An error occurred: {}", e),
        }
    }

    Ok(())
}

fn read_line() -> io::Result<Option<String>> {
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        Ok(None)
    } else {
        Ok(Some(line))
    }
}
