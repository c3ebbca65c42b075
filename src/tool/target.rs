//! Build graph data model as reported by `heph query --json`
//!
//! Targets are immutable snapshots: a changed target always arrives as part
//! of a new query result.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A node in the build graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Target {
    /// Unique address, e.g. `//pkg/foo:build`
    pub addr: String,

    #[serde(default)]
    pub private: bool,

    /// Annotation name -> arbitrary value
    #[serde(default, deserialize_with = "null_as_default")]
    pub annotations: BTreeMap<String, serde_json::Value>,

    /// Where the target was declared; each group is a call stack
    #[serde(default, deserialize_with = "null_as_default")]
    pub sources: Vec<SourceGroup>,

    /// Addresses of targets generated from this one's sources
    #[serde(default)]
    pub gen_sources: Option<Vec<String>>,

    #[serde(default)]
    pub package: Package,
}

impl Target {
    /// First recorded declaration position that lies in `file`
    pub fn position_in(&self, file: &Path) -> Option<&Position> {
        self.sources
            .iter()
            .flat_map(|group| group.call_frames.iter())
            .map(|frame| &frame.pos)
            .find(|pos| pos.file == file)
    }

    pub fn annotation(&self, name: &str) -> Option<&serde_json::Value> {
        self.annotations.get(name)
    }
}

/// One declaration call stack
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SourceGroup {
    #[serde(default, deserialize_with = "null_as_default")]
    pub call_frames: Vec<CallFrame>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallFrame {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pos: Position,
}

/// File position; `line` is 1-based and 0 means unknown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Position {
    #[serde(default)]
    pub file: PathBuf,
    #[serde(default)]
    pub line: u32,
}

impl Position {
    /// 0-based editor line, unknown positions map to the first line
    pub fn editor_line(&self) -> u32 {
        self.line.saturating_sub(1)
    }
}

/// Owning package descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Package {
    #[serde(default)]
    pub root: PackageRoot,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageRoot {
    /// Workspace root the package belongs to
    #[serde(default)]
    pub root: PathBuf,
    /// Package path relative to the workspace root
    #[serde(default)]
    pub rel_root: String,
    /// Absolute package directory
    #[serde(default)]
    pub abs: PathBuf,
}

/// Go encodes nil maps and slices as `null`
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
