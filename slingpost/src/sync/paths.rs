use std::path::Path;

/// Appends `child` to a remote resource path without doubling the slash.
pub fn concat_resource(parent: &str, child: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{child}")
    } else {
        format!("{parent}/{child}")
    }
}

/// Name with its last extension removed (`a.txt` -> `a`, `.profile` stays).
pub fn base_name(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name)
}
