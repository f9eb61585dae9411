use clap::Parser;
use slingpost::app;
use slingpost::cli::Cli;
use slingpost::config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    app::run(cli, Config::from_env()).await
}
