//! Fmt command - format a build file

use super::absolute;
use crate::cli::args::FmtArgs;
use crate::error::{LensError, LensResult};
use crate::ui::{self, UiContext};
use crate::workspace::Workspace;
use tokio::fs;
use tokio_util::sync::CancellationToken;

pub async fn execute(args: FmtArgs, workspace: &Workspace) -> LensResult<()> {
    let file = absolute(&args.file)?;
    let text = fs::read_to_string(&file)
        .await
        .map_err(|e| LensError::io(format!("reading {}", file.display()), e))?;

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let edit = workspace
        .formatter()
        .format_until(&file, &text, cancel)
        .await;
    interrupt.abort();

    let edit = edit
        .ok_or_else(|| LensError::User(format!("{} was not formatted", file.display())))?;

    if !args.write {
        print!("{}", edit.new_text);
        return Ok(());
    }

    let ctx = UiContext::detect();
    if edit.new_text == text {
        ui::step_info(&ctx, &format!("{} already formatted", file.display()));
        return Ok(());
    }

    fs::write(&file, &edit.new_text)
        .await
        .map_err(|e| LensError::io(format!("writing {}", file.display()), e))?;
    ui::step_ok(&ctx, &format!("Formatted {}", file.display()));

    Ok(())
}
