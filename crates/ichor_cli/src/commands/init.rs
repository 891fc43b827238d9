//! Init command implementation.

use super::CommandResult;
use ichor_core::{AlertConfig, Store, DEFAULT_SERIES, INDEX_CONFIG};
use tracing::info;

/// Creates the default series plus `extra`, and stores the default alert
/// configuration unless one already exists.
pub fn run(store: &Store, extra: &[String]) -> CommandResult {
    let mut names: Vec<&str> = DEFAULT_SERIES.to_vec();
    names.extend(extra.iter().map(String::as_str));
    store.initialize(&names)?;

    match store.get_object::<AlertConfig>(INDEX_CONFIG) {
        Ok(_) => info!("keeping existing alert configuration"),
        Err(e) if e.is_not_found() => {
            store.put_object(INDEX_CONFIG, &AlertConfig::default())?;
            info!("stored default alert configuration");
        }
        Err(e) => return Err(e.into()),
    }

    println!("Initialized {} series", names.len());
    Ok(())
}
