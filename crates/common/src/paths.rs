//! Filesystem naming shared by the report store and the HTTP browser.

use std::path::{Component, Path, PathBuf};

/// Directory name for a target: the `exchange:routingKey` string with
/// `:` and path separators replaced by `_`.
///
/// ```
/// assert_eq!(common::paths::target_dir_name("orders:created.*"), "orders_created.*");
/// ```
pub fn target_dir_name(target: &str) -> String {
    target
        .chars()
        .map(|c| match c {
            ':' | '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

/// File name for a diff path: `.customer.email` becomes
/// `customer.email.json`; the root path becomes `_root.json`.
pub fn diff_file_name(path: &str) -> String {
    let trimmed = path.trim_start_matches('.');
    if trimmed.is_empty() {
        "_root.json".to_string()
    } else {
        format!("{}.json", target_dir_name(trimmed))
    }
}

/// Resolve `relative` under `root`, rejecting anything that could escape it
/// (`..`, absolute paths, drive prefixes).
pub fn join_within(root: &Path, relative: &str) -> Option<PathBuf> {
    let rel = Path::new(relative);
    let mut out = root.to_path_buf();
    for comp in rel.components() {
        match comp {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return None;
            }
        }
    }
    Some(out)
}
