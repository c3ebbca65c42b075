//! Root command - print the workspace root

use crate::error::{LensError, LensResult};
use crate::workspace::Workspace;

pub async fn execute(workspace: &Workspace) -> LensResult<()> {
    let root = workspace
        .packages()
        .workspace_root()
        .await
        .map_err(LensError::Shared)?;
    println!("{}", root.display());
    Ok(())
}
