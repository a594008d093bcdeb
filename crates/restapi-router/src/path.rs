//! Slash-path utilities.
//!
//! Routing always works on canonical paths: a leading slash, single-slash
//! separators, no `.` or `..` segments, and no trailing slash except for
//! the root (the [`canonical`] form keeps a trailing slash that was present
//! in the input; [`clean`] never does).

/// Returns the canonical form of `path`.
///
/// ```rust
/// use restapi_router::path::canonical;
///
/// assert_eq!(canonical(""), "/");
/// assert_eq!(canonical("users//42/./posts/../"), "/users/42/");
/// assert_eq!(canonical("/../.."), "/");
/// ```
pub fn canonical(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut out = clean(path);
    if path.ends_with('/') && out != "/" {
        out.push('/');
    }
    out
}

/// Returns the canonical form of `path` without a trailing slash.
///
/// ```rust
/// use restapi_router::path::clean;
///
/// assert_eq!(clean("/users/"), "/users");
/// assert_eq!(clean("a/b/../c"), "/a/c");
/// ```
pub fn clean(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    push_segments(&mut stack, path);

    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    out.push_str(&stack.join("/"));
    out
}

/// Returns the non-empty segments of `path`.
///
/// ```rust
/// use restapi_router::path::split;
///
/// assert_eq!(split("/users/42/"), vec!["users", "42"]);
/// assert!(split("/").is_empty());
/// assert!(split("").is_empty());
/// ```
pub fn split(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

/// Splits the first segment off `path`.
///
/// The remainder always starts with `/`. Empty input yields `("", "")`.
///
/// ```rust
/// use restapi_router::path::unshift;
///
/// assert_eq!(unshift("/42/posts"), ("42", "/posts"));
/// assert_eq!(unshift("/42"), ("42", "/"));
/// assert_eq!(unshift(""), ("", ""));
/// ```
pub fn unshift(path: &str) -> (&str, &str) {
    if path.is_empty() {
        return ("", "");
    }

    let trimmed = path.trim_start_matches('/');
    match trimmed.find('/') {
        Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
        None => (trimmed, "/"),
    }
}

/// Joins path parts with single slashes.
///
/// The first part may carry an origin that is kept verbatim: a URI with a
/// scheme (`https://host`) or a protocol-relative prefix (`//host`). The
/// result keeps a leading slash if the first part had one and a trailing
/// slash if the last part had one. `.` and `..` segments are resolved.
///
/// ```rust
/// use restapi_router::path::join;
///
/// assert_eq!(join(&["/api", "v1/", "/users"]), "/api/v1/users");
/// assert_eq!(join(&["api", "users/"]), "api/users/");
/// assert_eq!(join(&["https://example.com/api", "v1"]), "https://example.com/api/v1");
/// assert_eq!(join(&["//cdn.example.com", "img", "a.png"]), "//cdn.example.com/img/a.png");
/// ```
pub fn join<S: AsRef<str>>(parts: &[S]) -> String {
    let Some((first, rest)) = parts.split_first() else {
        return String::new();
    };
    let (origin, first_path) = split_origin(first.as_ref());

    let mut segments: Vec<&str> = Vec::new();
    push_segments(&mut segments, first_path);
    for part in rest {
        push_segments(&mut segments, part.as_ref());
    }

    let leading = !origin.is_empty() || first_path.starts_with('/');
    let trailing = parts
        .last()
        .is_some_and(|last| last.as_ref().ends_with('/'));

    let mut out = String::from(origin);
    if leading && (origin.is_empty() || !segments.is_empty()) {
        out.push('/');
    }
    out.push_str(&segments.join("/"));
    if trailing && !segments.is_empty() {
        out.push('/');
    }
    out
}

/// Splits `scheme://authority` or `//authority` off the front of `part`.
fn split_origin(part: &str) -> (&str, &str) {
    let authority_start = if let Some(idx) = part.find("://") {
        idx + 3
    } else if part.starts_with("//") {
        2
    } else {
        return ("", part);
    };

    match part[authority_start..].find('/') {
        Some(idx) => part.split_at(authority_start + idx),
        None => (part, ""),
    }
}

fn push_segments<'a>(stack: &mut Vec<&'a str>, path: &'a str) {
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            _ => stack.push(segment),
        }
    }
}
