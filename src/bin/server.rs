//! Dashboard Server Binary
//!
//! Reads configuration from the environment (and `.env` when present),
//! then serves the authentication and dashboard routes.

use marching::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    log();
    kys();
    server::run(server::Config::from_env()?).await
}
