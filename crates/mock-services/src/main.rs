//! Supporting Services CLI
//!
//! 组合服务的命令行入口点。

use clap::Parser;
use mock_services::cli::{Cli, CommandRunner, Commands};
use supporting_shared::{config::AppConfig, observability};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 不存在时忽略
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = AppConfig::load("supporting-services")?;
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    let obs = observability::init(&config.service_name, &config.observability)?;
    let runner = CommandRunner::new(config, obs);

    match cli.command {
        Commands::Server {
            port,
            populate,
            customers,
        } => {
            runner.run_server(port, populate, customers).await?;
        }
        Commands::Populate { customers, output } => {
            runner.run_populate(customers, output)?;
        }
    }

    Ok(())
}
