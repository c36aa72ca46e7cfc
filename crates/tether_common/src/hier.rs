//! Hierarchical instance path helpers.
//!
//! A hierarchical path joins instance names with [`HIER_SEP`]. The top cell
//! has the empty path `""`; its child instances have single-segment paths
//! such as `top`, and a pin or net is addressed by appending its name as a
//! final segment (`top/u_ila_0/probe0[3]`).
//!
//! Ancestry is always decided segment-wise: `top/u1` is not an ancestor of
//! `top/u10/x` even though it is a string prefix of it.

/// Separator between hierarchy levels.
pub const HIER_SEP: char = '/';

/// Splits a path into its parent path and final segment.
///
/// A single-segment path has the empty parent.
pub fn split_leaf(path: &str) -> (&str, &str) {
    match path.rfind(HIER_SEP) {
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => ("", path),
    }
}

/// Returns the parent of `path`, or `None` for the top path `""`.
pub fn parent(path: &str) -> Option<&str> {
    if path.is_empty() {
        None
    } else {
        Some(split_leaf(path).0)
    }
}

/// Joins a child name onto a parent path.
pub fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}{HIER_SEP}{child}")
    }
}

/// Iterates over the segments of a path. The top path has no segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(HIER_SEP).filter(|s| !s.is_empty())
}

/// Number of segments in a path.
pub fn depth(path: &str) -> usize {
    segments(path).count()
}

/// Returns the first segment of a path, if any.
pub fn first_segment(path: &str) -> Option<&str> {
    segments(path).next()
}

/// Returns `true` if `ancestor` is `path` itself or one of its ancestors.
pub fn is_ancestor_or_self(ancestor: &str, path: &str) -> bool {
    if ancestor.is_empty() {
        return true;
    }
    match path.strip_prefix(ancestor) {
        Some(rest) => rest.is_empty() || rest.starts_with(HIER_SEP),
        None => false,
    }
}

/// Returns the segments of `path` below `ancestor`, or `None` when
/// `ancestor` is not an ancestor of (or equal to) `path`.
pub fn relative_segments<'a>(ancestor: &str, path: &'a str) -> Option<Vec<&'a str>> {
    if !is_ancestor_or_self(ancestor, path) {
        return None;
    }
    let rest = &path[ancestor.len()..];
    Some(segments(rest).collect())
}
