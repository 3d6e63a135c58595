use std::path::Path;

use crate::io::config_io::expand_home;
use crate::io::paths::{Layout, YEARS_HEADER};
use crate::io::table_io::{self, TableError};
use crate::model::config::TallyConfig;
use crate::model::tracker::Tracker;

/// Open the record tree, creating the base directory and `years.csv` if
/// they are missing. Safe to call on every start.
///
/// `base_override` (the `-C` flag) takes precedence over `config.base_dir`.
pub fn open_tracker(config: TallyConfig, base_override: Option<&Path>) -> Result<Tracker, TableError> {
    let root = expand_home(base_override.unwrap_or(&config.base_dir));

    if table_io::create_dir_if_absent(&root)? {
        tracing::info!(base = %root.display(), "created base directory");
    }
    if table_io::create_if_absent(&Layout::new(&root).years_registry(), &YEARS_HEADER)? {
        tracing::info!(base = %root.display(), "created years registry");
    }

    Ok(Tracker { root, config })
}
