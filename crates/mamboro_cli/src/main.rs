//! Terminal chat entry point for mamboro.

mod repl;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mamboro_core::ChatConfig;

#[derive(Parser, Debug)]
#[command(name = "mamboro", about = "Streaming chat over a locally served language model")]
struct Cli {
    /// Model identifier served by the inference engine
    #[arg(long)]
    model: Option<String>,

    /// Base URL of the inference engine
    #[arg(long)]
    engine_url: Option<String>,

    /// Override the system instruction
    #[arg(long)]
    system: Option<String>,

    /// Cap on generated tokens per reply
    #[arg(long)]
    max_new_tokens: Option<u32>,
}

impl Cli {
    /// CLI flags win over environment over defaults.
    fn apply(self, mut config: ChatConfig) -> ChatConfig {
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(engine_url) = self.engine_url {
            config.engine_url = engine_url;
        }
        if let Some(system) = self.system {
            config.system_prompt = system;
        }
        if let Some(max_new_tokens) = self.max_new_tokens {
            config.params.max_new_tokens = max_new_tokens;
        }
        config
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.apply(ChatConfig::from_env());

    if let Err(e) = repl::run(config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
