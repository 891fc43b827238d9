//! Export command implementation.

use super::CommandResult;
use ichor_core::{
    Carbohydrate, GlucosePoint, Insulin, Store, SERIES_CARBOHYDRATE, SERIES_GLUCOSE,
    SERIES_GLUCOSE_PRED, SERIES_INSULIN,
};
use std::path::Path;

/// Writes the four default series to CSV files under `dest`.
pub fn run(store: &Store, dest: &Path) -> CommandResult {
    let mut written =
        store.export::<GlucosePoint>(&[SERIES_GLUCOSE, SERIES_GLUCOSE_PRED], dest)?;
    written.extend(store.export::<Carbohydrate>(&[SERIES_CARBOHYDRATE], dest)?);
    written.extend(store.export::<Insulin>(&[SERIES_INSULIN], dest)?);

    for path in written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
