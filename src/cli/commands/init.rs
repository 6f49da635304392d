//! Init command handler

use std::path::Path;

use crate::config::Config;

pub fn cmd_init(path: &Path, setup: bool) -> anyhow::Result<()> {
    let created = if path.exists() {
        false
    } else {
        Config::default().save_to_path(path)?;
        true
    };

    if setup {
        let mut config = Config::load_from_path(path)?;
        config.general.setup_mode = true;
        config.save_to_path(path)?;
    }

    if created {
        println!("Created {}", path.display());
    } else {
        println!("{} already exists", path.display());
    }

    if setup {
        println!("Setup mode enabled. Log in as admin and configure the datastore.");
    }

    Ok(())
}
