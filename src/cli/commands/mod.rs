//! CLI command implementations

pub mod config;
pub mod fmt;
pub mod lenses;
pub mod root;
pub mod run_configs;
pub mod session;
pub mod targets;
pub mod tasks;

pub use config::execute as config;
pub use fmt::execute as fmt;
pub use lenses::execute as lenses;
pub use root::execute as root;
pub use run_configs::execute as run_configs;
pub use session::execute as session;
pub use targets::execute as targets;
pub use tasks::execute as tasks;

use crate::cache::normalize;
use crate::error::{LensError, LensResult};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// `file` as an absolute, lexically normalized path
pub(crate) fn absolute(file: &Path) -> LensResult<PathBuf> {
    if file.is_absolute() {
        return Ok(normalize(file));
    }
    let cwd =
        std::env::current_dir().map_err(|e| LensError::io("getting current directory", e))?;
    Ok(normalize(&cwd.join(file)))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> LensResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}
