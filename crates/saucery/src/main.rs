use std::sync::Arc;

use saucery_core::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    saucery_core::logging::init("saucery")?;

    let cfg = Arc::new(Config::load()?);
    saucery_discord::run(cfg).await
}
