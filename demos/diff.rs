use dbhub_http::{DbHubClient, DiffTarget, Identifier, MergeStrategy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let db = DbHubClient::from_env().map_err(anyhow::Error::msg)?;

    let first = DiffTarget::new(
        "justinclift",
        "DB4S download stats.sqlite",
        Identifier::commit("34cbeebfc347a09406707f4220cd40f60778692523d2e7d227ccd92f4125c9ea"),
    );
    let second = DiffTarget::same_database(Identifier::commit(
        "bc6a07955811d86db79e9b4f7fdc3cb2360d40da793066510d792588a8bf8de2",
    ));

    let diffs = db
        .diff(&first, &second, MergeStrategy::PreservePkMerge)
        .await?;

    println!("SQL statements for turning the first version into the second:");
    for object in &diffs.diff {
        if let Some(sql) = object.schema.as_ref().and_then(|schema| schema.sql.as_deref()) {
            println!("{sql}");
        }
        for change in &object.data {
            if let Some(sql) = change.sql.as_deref() {
                println!("{sql}");
            }
        }
    }

    Ok(())
}
