//! Query expression construction
//!
//! Only builds expressions; the query language itself is heph's business.

/// Marks a target runnable from the file it names
pub const ANNOTATION_TASK: &str = "vscode-task";

/// Marks a target launchable (debugger configuration) from the file it names
pub const ANNOTATION_LAUNCH: &str = "vscode-launch";

/// Field projection requested from `heph query --json`
pub const JSON_FIELDS: &str = "{Addr,Private,Annotations,Package,Sources,GenSources}";

/// Every target in the graph
pub const ALL_TARGETS: &str = ":";

/// Flag excluding generated targets from a query
pub const NO_GEN_FLAG: &str = "--no-gen";

/// All direct targets of a package (`""` is the workspace root package)
pub fn package_targets(package: &str) -> String {
    format!("//{}:*", package)
}

/// Scoped query for one package, optionally unioned with its generated sources
pub fn package_query(package: &str, include_generated: bool) -> String {
    let direct = package_targets(package);
    if include_generated {
        format!("{direct} || gen_source({direct})")
    } else {
        direct
    }
}

pub fn has_annotation(name: &str) -> String {
    format!("has_annotation(\"{}\")", name)
}

/// Union of `has_annotation` predicates
pub fn any_annotation(names: &[&str]) -> String {
    names
        .iter()
        .map(|name| has_annotation(name))
        .collect::<Vec<_>>()
        .join(" || ")
}

/// Targets that contribute run or launch configurations
pub fn run_config_query() -> String {
    any_annotation(&[ANNOTATION_TASK, ANNOTATION_LAUNCH])
}
