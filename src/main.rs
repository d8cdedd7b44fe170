use clap::Parser;
use dotenv::dotenv;

use crate::cli::Cli;
use crate::logger::init_logger;

mod app;
mod cli;
mod config;
mod error;
mod logger;
mod models;
mod services;

#[cfg(test)]
mod tests;

#[tokio::main]
async fn main() {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let cli = Cli::parse();

    if let Err(e) = app::run(cli).await {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
