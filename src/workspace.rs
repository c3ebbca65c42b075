//! Everything one editor session needs, wired to a single context
//!
//! The workspace owns the caches and views and routes the host's events:
//! file changes and refresh requests become invalidations, settings changes
//! are swapped into the context.

use crate::cache::ScopedQueryCache;
use crate::config::Config;
use crate::context::{Context, Invalidation};
use crate::error::{LensError, LensResult};
use crate::views::{
    BuildFileLenses, CodeLens, DocumentFormatter, EditorState, FileRunProvider, TaskProvider,
};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

pub struct Workspace {
    ctx: Arc<Context>,
    packages: Arc<ScopedQueryCache>,
    build_lenses: BuildFileLenses,
    file_run: Arc<FileRunProvider>,
    editor: Arc<EditorState>,
    tasks: TaskProvider,
    formatter: DocumentFormatter,
    build_files: RwLock<GlobSet>,
}

impl Workspace {
    pub fn new(ctx: &Arc<Context>) -> LensResult<Self> {
        let build_files = build_globset(&ctx.config().build_files.patterns)?;
        let packages = ScopedQueryCache::new(ctx);
        let file_run = FileRunProvider::new(ctx);

        Ok(Self {
            ctx: Arc::clone(ctx),
            build_lenses: BuildFileLenses::new(ctx, &packages),
            editor: EditorState::new(ctx, &file_run),
            tasks: TaskProvider::new(ctx),
            formatter: DocumentFormatter::new(ctx),
            packages,
            file_run,
            build_files: RwLock::new(build_files),
        })
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    pub fn packages(&self) -> &Arc<ScopedQueryCache> {
        &self.packages
    }

    pub fn build_lenses(&self) -> &BuildFileLenses {
        &self.build_lenses
    }

    pub fn file_run(&self) -> &Arc<FileRunProvider> {
        &self.file_run
    }

    pub fn editor(&self) -> &Arc<EditorState> {
        &self.editor
    }

    pub fn tasks(&self) -> &TaskProvider {
        &self.tasks
    }

    pub fn formatter(&self) -> &DocumentFormatter {
        &self.formatter
    }

    /// Whether `path` matches one of the configured build file globs
    pub fn is_build_file(&self, path: &Path) -> bool {
        self.build_files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_match(path)
    }

    /// Lenses for `file`: copy-address lenses in build files, run lenses elsewhere
    pub async fn lenses(&self, file: &Path) -> Vec<CodeLens> {
        if self.is_build_file(file) {
            self.build_lenses.lenses(file).await
        } else {
            self.file_run.code_lenses(file).await
        }
    }

    /// Drop all cached graph data
    pub fn refresh(&self) {
        self.ctx.invalidate(Invalidation::Refresh);
    }

    /// A file was created, changed or deleted. Returns whether it invalidated anything.
    pub fn file_changed(&self, path: &Path) -> bool {
        if !self.ctx.config().build_files.watcher_enabled {
            debug!("Watcher disabled, ignoring change to {}", path.display());
            return false;
        }
        if !self.is_build_file(path) {
            return false;
        }

        self.ctx
            .invalidate(Invalidation::BuildFileChanged(path.to_path_buf()));
        true
    }

    /// Swap in new settings; everything derived from the old ones is invalidated
    pub fn apply_config(&self, config: Config) -> LensResult<()> {
        let build_files = build_globset(&config.build_files.patterns)?;
        *self
            .build_files
            .write()
            .unwrap_or_else(PoisonError::into_inner) = build_files;
        self.ctx.replace_config(config);
        Ok(())
    }
}

fn build_globset(patterns: &[String]) -> LensResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| LensError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| LensError::InvalidPattern {
        pattern: patterns.join(", "),
        reason: e.to_string(),
    })
}
