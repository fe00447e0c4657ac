use clap::{Parser, Subcommand};
use respcounter::config::Config;
use respcounter::Error;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(about = "Increment or read the usage counter")]
struct Args {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Add one to the counter
    Incr,
    /// Print the current count
    Get,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let args = Args::parse();
    let counter = args.config.counter();

    match args.action {
        Action::Incr => counter.increment().await,
        Action::Get => println!("{}", counter.read().await),
    }

    Ok(())
}
