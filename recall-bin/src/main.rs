use clap::Parser;
use recall_cli::Cli;

#[tokio::main]
async fn main() {
    // A missing .env is fine; GOOGLE_API_KEY may come from the environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
