use anyhow::Result;

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    opsearch::cli::run().await
}
