//! Curve Sniper - Bonding Curve Launch Sniper
//!
//! Watches pump.fun-style token launches and trades the ones that clear
//! every safety and opportunity filter.

use anyhow::Result;

use curve_sniper::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}
