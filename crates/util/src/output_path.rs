//! Output path construction for materialized [`flowc_types::Argument`] values,
//! and the `mergeToDir` special case for directory-typed inputs.

use flowc_types::{ServiceParameter, Value};

/// `makeOutputPath(servicePar, outputParam) -> String`.
///
/// `base` is the caller-resolved `outPath`/`tmpPath` root, chosen by the
/// caller according to `output_param.store`. The next id from `id_gen` is
/// appended, followed by the service parameter's `file_suffix` (if any).
/// Redundant `/` separators are normalized away.
pub fn make_output_path(base: &str, prefix: Option<&str>, service_param: &ServiceParameter, next_id: &str) -> String {
    let base = base.trim_end_matches('/');
    let dir = match prefix {
        Some(p) if p.starts_with('/') => p.trim_end_matches('/').to_string(),
        Some(p) => format!("{base}/{}", p.trim_matches('/')),
        None => base.to_string(),
    };
    let suffix = service_param.file_suffix.as_deref().unwrap_or("");
    normalize_separators(&format!("{dir}/{next_id}{suffix}"))
}

fn normalize_separators(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(c);
    }
    out
}

/// `mergeToDir` policy: when an INPUT parameter's `dataType` is the
/// well-known `"directory"` tag and the provided value is a sequence of file
/// paths, collapse it to the longest common path prefix, truncated at the
/// last path separator.
///
/// Returns `None` when `value` is not an array of strings (the caller then
/// falls through to the generic flattening path).
pub fn merge_to_dir(value: &Value) -> Option<String> {
    let items = value.as_array()?;
    let paths: Vec<&str> = items.iter().map(|v| v.as_str()).collect::<Option<Vec<_>>>()?;
    if paths.is_empty() {
        return None;
    }
    if paths.len() == 1 {
        return Some(common_dir(paths[0]));
    }

    let mut prefix: Vec<char> = paths[0].chars().collect();
    for path in &paths[1..] {
        let chars: Vec<char> = path.chars().collect();
        let common_len = prefix.iter().zip(chars.iter()).take_while(|(a, b)| a == b).count();
        prefix.truncate(common_len);
        if prefix.is_empty() {
            break;
        }
    }
    let prefix: String = prefix.into_iter().collect();
    Some(common_dir(&prefix))
}

fn common_dir(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}
