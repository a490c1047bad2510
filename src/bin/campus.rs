use anyhow::Result;
use campus::cli;

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    let action = cli::start()?;

    let result = action.execute().await;

    cli::shutdown_tracer();

    result
}
