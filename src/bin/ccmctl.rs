//! ccmctl - command-line client for the CCM configuration API

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ccm::client::{ConfigClient, DEFAULT_BASE_URL};

#[derive(Parser, Debug)]
#[command(name = "ccmctl")]
#[command(about = "Read and write configuration served by ccm-server")]
#[command(version)]
struct CliArgs {
    /// Base URL of the configuration API
    #[arg(long, env = "CCM_URL", default_value = DEFAULT_BASE_URL)]
    url: String,

    /// Project name
    #[arg(long, default_value = "myapp")]
    project: String,

    /// Environment name
    #[arg(long, default_value = "dev")]
    environment: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the value of a key
    Get {
        key: String,
        /// Printed instead of failing when the key is missing
        #[arg(long)]
        default: Option<String>,
    },
    /// Create or overwrite a key
    Set { key: String, value: String },
    /// Print every key of the environment as JSON
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let client = ConfigClient::new(args.url);
    let (project, environment) = (args.project.as_str(), args.environment.as_str());

    match args.command {
        Command::Get { key, default } => match default {
            Some(default) => {
                println!("{}", client.get_or(project, environment, &key, &default).await?);
            }
            None => match client.get(project, environment, &key).await? {
                Some(value) => println!("{}", value),
                None => anyhow::bail!("Key not found: {}/{}/{}", project, environment, key),
            },
        },
        Command::Set { key, value } => {
            client.set(project, environment, &key, &value).await?;
            eprintln!("Configuration updated: {} = {}", key, value);
        }
        Command::List => {
            let config = client.get_environment(project, environment).await?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
