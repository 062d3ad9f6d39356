use crate::config::AppConfig;
use crate::database::PgVoteStore;

pub async fn handle(config: AppConfig) -> anyhow::Result<()> {
    let store = PgVoteStore::connect(&config.database).await?;
    store.ensure_schema().await?;
    println!("Votes table '{}' is ready", config.database.votes_table);
    Ok(())
}
