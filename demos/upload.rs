use dbhub_http::{DbHubClient, UploadInformation};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let db = DbHubClient::from_env().map_err(anyhow::Error::msg)?;

    let path = std::env::args().nth(1).unwrap_or_else(|| "example.db".to_owned());
    let file = tokio::fs::read(&path).await?;

    let info = UploadInformation::with_commit_message("An example upload");
    db.upload("somedb.sqlite", &info, file).await?;

    println!("Database uploaded");
    Ok(())
}
