//! Path string helpers.
//!
//! Paths travel through the pipeline as plain `&str`/`String` because they
//! are used as map keys and echoed verbatim in results and logs.

use std::path::Path;

/// Extension of `path`: everything from the last `.` onward, or `""`.
///
/// The dot is searched in the whole string, so `dir.v2/file` yields
/// `.v2/file`. Routing keys are registered with their leading dot (`.ir`).
pub fn get_file_extension(path: &str) -> &str {
    match path.rfind('.') {
        Some(i) => &path[i..],
        None => "",
    }
}

/// Swap a trailing `old` extension for `new`; append `new` when `path` does
/// not end in `old`.
pub fn replace_file_extension(path: &str, old: &str, new: &str) -> String {
    match path.strip_suffix(old) {
        Some(stem) if !old.is_empty() => format!("{stem}{new}"),
        _ => format!("{path}{new}"),
    }
}

/// Place `path` under `namespace`, relative to `base_directory`.
///
/// Without a namespace the path is returned unchanged. A path outside the
/// base directory keeps its full (relative) form under the namespace.
pub fn rebase_output_path(
    path: &str,
    base_directory: Option<&Path>,
    namespace: Option<&str>,
) -> String {
    let Some(namespace) = namespace else {
        return path.to_string();
    };
    let relative = base_directory
        .and_then(|base| Path::new(path).strip_prefix(base).ok())
        .unwrap_or_else(|| Path::new(path));
    let relative = relative.to_string_lossy();
    let relative = relative.trim_start_matches('/');
    format!("{}/{}", namespace.trim_end_matches('/'), relative)
}
