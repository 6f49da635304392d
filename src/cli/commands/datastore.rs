//! Datastore check command handler

use crate::config::Config;
use crate::services::datastore_impl::probe;

pub async fn cmd_check_datastore(config: &Config) -> anyhow::Result<()> {
    let target = &config.database;
    let shown = if target.is_sqlite() {
        target.database_url()
    } else {
        format!("{}@{}/{}", target.user, target.host, target.base)
    };

    match probe(target).await {
        Ok(()) => {
            println!("Datastore reachable: {shown}");
            Ok(())
        }
        Err(e) => {
            println!("Datastore check failed: {shown}");
            Err(e.into())
        }
    }
}
