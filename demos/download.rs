use dbhub_http::{DbHubClient, Identifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let db = DbHubClient::from_env().map_err(anyhow::Error::msg)?;

    let bytes = db
        .download(
            "justinclift",
            "Join Testing.sqlite",
            &Identifier::default(),
        )
        .await?;
    tokio::fs::write("Join Testing.sqlite", &bytes).await?;

    println!("Saved {} bytes", bytes.len());
    Ok(())
}
