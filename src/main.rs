use clap::Parser;
use tracing_subscriber::EnvFilter;

use nestegg::api::{Cli, Command, cli, run_http_server};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nestegg=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match Cli::parse().command {
        Command::Serve { port } => run_http_server(port)
            .await
            .map(|()| String::new())
            .map_err(|e| format!("Server error: {e}")),
        Command::Corpus(args) => cli::run_corpus_command(&args),
        Command::Sip(args) => cli::run_sip_command(&args),
    };

    match result {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
