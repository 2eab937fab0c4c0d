/// Normalises a registry key prefix to `/a/b` form.
///
/// Surrounding whitespace and slashes are dropped; an empty prefix stays
/// empty so keys start right at the root (`/namespaces/...`).
pub fn sanitize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }

    format!("/{trimmed}")
}
