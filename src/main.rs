#![cfg(not(tarpaulin_include))]

use size_sorter::app;
use size_sorter::config::Config;

/// Main entry point for the size sorter web service
///
/// Logging defaults to `info` and can be changed with `RUST_LOG`. Listen
/// address, snapshot path and allowed origins come from the environment;
/// see [`Config::load`].
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load()?;
    log::info!("starting size sorter with {:?}", config);

    app::run(config).await
}
