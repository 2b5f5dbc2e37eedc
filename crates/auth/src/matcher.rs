//! Resource pattern matching.
//!
//! Warden uses exactly one matching mode: segment placeholders. A stored
//! resource such as `/api/users/:id` matches a request path when both split
//! into the same number of `/` segments and every pattern segment either
//! starts with `:` (matching any single non-empty segment) or equals the
//! request segment byte-for-byte. There is no glob or prefix matching, and
//! actions are always compared literally.

/// Does `pattern` match the concrete request `path`?
pub fn resource_matches(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) => {
                if let Some(_name) = p.strip_prefix(':') {
                    if s.is_empty() {
                        return false;
                    }
                } else if p != s {
                    return false;
                }
            }
            _ => return false,
        }
    }
}
