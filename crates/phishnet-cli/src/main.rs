//! phishnet - attachment reputation scanner

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    phishnet_cli::run().await
}
