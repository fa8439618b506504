use dbhub_http::{BlobPolicy, DbHubClient, Identifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let db = DbHubClient::from_env().map_err(anyhow::Error::msg)?;

    let tables = db
        .tables("justinclift", "Join Testing.sqlite", &Identifier::default())
        .await?;
    println!("Tables: {tables:?}");

    let result = db
        .query(
            "justinclift",
            "Join Testing.sqlite",
            &Identifier::default(),
            BlobPolicy::Base64,
            "SELECT table1.Name, table2.value FROM table1 JOIN table2 USING (id) ORDER BY table1.id",
        )
        .await?;

    for row in result.rows {
        println!("{}", row.fields.join(" | "));
    }

    Ok(())
}
