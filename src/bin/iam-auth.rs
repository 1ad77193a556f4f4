use anyhow::Result;
use iam_auth::cli::start;

#[tokio::main]
async fn main() -> Result<()> {
    let action = start()?;
    action.execute().await?;
    Ok(())
}
