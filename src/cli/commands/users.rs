//! List users command handler

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_list_users(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.database.database_url()).await?;
    let users = store.list_users().await?;

    if users.is_empty() {
        println!("No users yet.");
        return Ok(());
    }

    println!("Users ({} total)", users.len());
    println!("{:-<50}", "");

    for user in users {
        let marker = if user.has_session() { "*" } else { " " };
        println!(
            "{marker} {:>4}  {:<24} {}",
            user.id.value(),
            user.name,
            user.privilege
        );
    }

    println!();
    println!("* = active session");

    Ok(())
}
