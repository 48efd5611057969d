//! URL joining and resolution.
//!
//! Page paths stored in content trees are site-relative and may carry a
//! leading slash or not; site URLs may carry a trailing slash or not. The
//! helpers here normalize both so every produced URL has exactly one
//! separator at the seam.

// ============================================================================
// Joining
// ============================================================================

/// Join a site URL (or URL prefix) with a site-relative path.
///
/// Exactly one `/` ends up between the two parts regardless of how many
/// either side brings along.
///
/// | base | path | result |
/// |------|------|--------|
/// | `https://ex.org` | `about` | `https://ex.org/about` |
/// | `https://ex.org/` | `/about` | `https://ex.org/about` |
/// | `/` | `de/index.html` | `/de/index.html` |
pub fn join_site_path(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve `path` against `base` the way a browser resolves a relative URL.
///
/// - a path with its own scheme is returned unchanged
/// - an absolute path replaces everything after the origin of `base`
/// - a relative path replaces the last segment of `base`
pub fn resolve_url(base: &str, path: &str) -> String {
    if path.contains("://") {
        return path.to_owned();
    }
    match split_origin(base) {
        Some((origin, base_path)) => {
            if path.starts_with('/') {
                format!("{origin}{path}")
            } else {
                let dir = &base_path[..base_path.rfind('/').map_or(0, |i| i + 1)];
                format!("{origin}{dir}{path}")
            }
        }
        None => {
            if path.starts_with('/') {
                path.to_owned()
            } else {
                let dir = &base[..base.rfind('/').map_or(0, |i| i + 1)];
                format!("{dir}{path}")
            }
        }
    }
}

/// Split a URL into `(origin, path)` where origin is `scheme://host`.
///
/// A URL without a path component gets `/` as its path. Returns `None`
/// when `base` has no scheme.
fn split_origin(url: &str) -> Option<(&str, &str)> {
    let scheme_end = url.find("://")?;
    let rest_start = scheme_end + 3;
    match url[rest_start..].find('/') {
        Some(i) => Some((&url[..rest_start + i], &url[rest_start + i..])),
        None => Some((url, "/")),
    }
}

// ============================================================================
// Tests
// ============================================================================
