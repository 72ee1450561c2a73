#![deny(warnings)]

use persistence::{create_save, default_sqlite_url, init_db, list_saves};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| default_sqlite_url().to_string());
    let pool = init_db(&url).await?;
    if list_saves(&pool).await?.is_empty() {
        let id = create_save(&pool, "default", Some("initialized")).await?;
        println!("Created save slot {id}");
    }
    println!("DB migrated at {}", url);
    Ok(())
}
