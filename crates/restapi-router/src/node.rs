//! Routing trie node implementation.
//!
//! Each node represents one path segment. A node has any number of fixed
//! children (kept sorted for binary search), at most one dynamic child, a
//! per-method handler table, an optional default handler, an optional
//! embedded [`ServeMux`], and the middleware registered at that scope.

use crate::method_router::MethodRouter;
use crate::middleware::BoxedMiddleware;
use crate::mux::ServeMux;
use crate::path;
use regex::Regex;
use restapi_core::BoxedHandler;
use smallvec::SmallVec;
use std::sync::{Arc, OnceLock};

/// Binding names of a dynamic node; most nodes have one or two.
pub(crate) type Aliases = SmallVec<[String; 2]>;

/// Type of path segment in the trie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    /// Literal segment (e.g., "users")
    Fixed,
    /// Dynamic segment bound under every alias (e.g., ":id")
    Dynamic(Aliases),
}

/// Returns `true` for segments of the form `:name`.
pub(crate) fn is_dynamic_segment(segment: &str) -> bool {
    static DYNAMIC: OnceLock<Regex> = OnceLock::new();
    DYNAMIC
        .get_or_init(|| Regex::new(r"^:[\w\p{P}]+$").expect("valid regex"))
        .is_match(segment)
}

/// A node in the routing trie.
#[derive(Clone)]
pub(crate) struct Node {
    /// The path segment this node represents
    pub(crate) segment: String,

    /// Fixed or dynamic
    pub(crate) kind: SegmentKind,

    /// Method-specific handlers
    pub(crate) methods: MethodRouter,

    /// Handler serving any method when no method entry exists
    pub(crate) default: Option<BoxedHandler>,

    /// Embedded fallback multiplexer
    pub(crate) mux: Option<Arc<ServeMux>>,

    /// Middleware applied to every handler reached through this node
    pub(crate) middleware: Vec<BoxedMiddleware>,

    /// Fixed children, sorted by segment for binary search
    pub(crate) fixed_children: Vec<Node>,

    /// Dynamic child (at most one per node)
    pub(crate) dynamic_child: Option<Box<Node>>,
}

impl Default for Node {
    fn default() -> Self {
        Self::root()
    }
}

impl Node {
    fn new(segment: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            segment: segment.into(),
            kind,
            methods: MethodRouter::new(),
            default: None,
            mux: None,
            middleware: Vec::new(),
            fixed_children: Vec::new(),
            dynamic_child: None,
        }
    }

    /// Creates a root node for the trie.
    pub(crate) fn root() -> Self {
        Self::new("", SegmentKind::Fixed)
    }

    /// Returns the aliases of a dynamic node.
    pub(crate) fn aliases(&self) -> &[String] {
        match &self.kind {
            SegmentKind::Dynamic(aliases) => aliases,
            SegmentKind::Fixed => &[],
        }
    }

    /// Returns the node at `path`, creating missing nodes.
    pub(crate) fn descend_mut(&mut self, path: &str) -> &mut Node {
        let mut node = self;
        for segment in path::split(path) {
            node = node.child_mut(segment);
        }
        node
    }

    /// Returns the node registered for `path`, if any.
    ///
    /// Segments are compared as registered: `:name` segments select the
    /// dynamic child.
    pub(crate) fn descend(&self, path: &str) -> Option<&Node> {
        let mut node = self;
        for segment in path::split(path) {
            node = if is_dynamic_segment(segment) {
                node.dynamic_child.as_deref()?
            } else {
                node.find_fixed(segment)?
            };
        }
        Some(node)
    }

    /// Returns the child for a registered segment, creating it if needed.
    ///
    /// A second `:name` at the same position adds an alias to the existing
    /// dynamic child instead of creating a sibling.
    fn child_mut(&mut self, segment: &str) -> &mut Node {
        if is_dynamic_segment(segment) {
            let name = &segment[1..];
            let child = self.dynamic_child.get_or_insert_with(|| {
                Box::new(Node::new(segment, SegmentKind::Dynamic(Aliases::new())))
            });
            if let SegmentKind::Dynamic(aliases) = &mut child.kind {
                if !aliases.iter().any(|alias| alias == name) {
                    aliases.push(name.to_string());
                }
            }
            return child;
        }

        let idx = match self
            .fixed_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
        {
            Ok(idx) => idx,
            Err(idx) => {
                self.fixed_children
                    .insert(idx, Node::new(segment, SegmentKind::Fixed));
                idx
            }
        };
        &mut self.fixed_children[idx]
    }

    /// Finds a fixed child by segment using binary search.
    pub(crate) fn find_fixed(&self, segment: &str) -> Option<&Node> {
        self.fixed_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.fixed_children[i])
    }

    /// Returns the child matching a request segment.
    ///
    /// Fixed children always beat the dynamic child.
    pub(crate) fn match_segment(&self, segment: &str) -> Option<&Node> {
        self.find_fixed(segment)
            .or_else(|| self.dynamic_child.as_deref())
    }

    /// Returns the embedded mux, creating it if needed.
    pub(crate) fn mux_mut(&mut self) -> &mut ServeMux {
        Arc::make_mut(self.mux.get_or_insert_with(Default::default))
    }

    /// Deep-merges `other` into this node.
    ///
    /// Middleware, children, aliases, and mux patterns are unioned;
    /// handlers from `other` replace handlers registered here.
    pub(crate) fn merge(&mut self, other: Node) {
        let Node {
            methods,
            default,
            mux,
            middleware,
            fixed_children,
            dynamic_child,
            ..
        } = other;

        self.methods.merge(methods);
        if default.is_some() {
            self.default = default;
        }
        if let Some(mux) = mux {
            self.mux_mut().merge(&mux);
        }
        self.middleware.extend(middleware);

        for child in fixed_children {
            let segment = child.segment.clone();
            self.child_mut(&segment).merge(child);
        }

        if let Some(child) = dynamic_child {
            let child = *child;
            match &mut self.dynamic_child {
                Some(existing) => {
                    if let (SegmentKind::Dynamic(ours), SegmentKind::Dynamic(theirs)) =
                        (&mut existing.kind, &child.kind)
                    {
                        for alias in theirs {
                            if !ours.contains(alias) {
                                ours.push(alias.clone());
                            }
                        }
                    }
                    existing.merge(child);
                }
                None => self.dynamic_child = Some(Box::new(child)),
            }
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("segment", &self.segment)
            .field("kind", &self.kind)
            .field("methods", &self.methods)
            .field("default", &self.default.is_some())
            .field("mux", &self.mux)
            .field("middleware", &self.middleware.len())
            .field("fixed_children", &self.fixed_children)
            .field("dynamic_child", &self.dynamic_child)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use restapi_core::{empty, handler_fn, Request};

    fn noop() -> BoxedHandler {
        Arc::new(handler_fn(|_req: Request| async { http::Response::new(empty()) }))
    }

    #[test]
    fn test_dynamic_segment_syntax() {
        assert!(is_dynamic_segment(":id"));
        assert!(is_dynamic_segment(":user_id"));
        assert!(is_dynamic_segment(":user-id"));
        assert!(is_dynamic_segment(":id.json"));
        assert!(!is_dynamic_segment(":"));
        assert!(!is_dynamic_segment("id"));
        assert!(!is_dynamic_segment("a:id"));
        assert!(!is_dynamic_segment(":a b"));
    }

    #[test]
    fn test_fixed_children_sorted() {
        let mut root = Node::root();
        root.descend_mut("/c");
        root.descend_mut("/a");
        root.descend_mut("/b");
        let segments: Vec<_> = root.fixed_children.iter().map(|c| c.segment.as_str()).collect();
        assert_eq!(segments, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dynamic_aliases_share_node() {
        let mut root = Node::root();
        root.descend_mut("/a/:x").methods.set(Method::GET, noop());
        root.descend_mut("/a/:y").methods.set(Method::POST, noop());

        let a = root.find_fixed("a").unwrap();
        let dynamic = a.dynamic_child.as_deref().unwrap();
        assert_eq!(dynamic.aliases(), ["x".to_string(), "y".to_string()]);
        assert_eq!(dynamic.methods.allowed_methods(), vec![Method::GET, Method::POST]);
    }

    #[test]
    fn test_fixed_beats_dynamic() {
        let mut root = Node::root();
        root.descend_mut("/users/:id");
        root.descend_mut("/users/me");

        let users = root.find_fixed("users").unwrap();
        assert_eq!(users.match_segment("me").unwrap().segment, "me");
        assert_eq!(users.match_segment("42").unwrap().segment, ":id");
    }

    #[test]
    fn test_descend_registered_path() {
        let mut root = Node::root();
        root.descend_mut("/users/:id/posts");
        assert!(root.descend("/users/:id/posts").is_some());
        assert!(root.descend("/users/:other/posts").is_some());
        assert!(root.descend("/users/42").is_none());
    }

    #[test]
    fn test_merge_is_deep_union() {
        let mut left = Node::root();
        left.descend_mut("/a").methods.set(Method::GET, noop());
        left.descend_mut("/:x");

        let mut right = Node::root();
        right.descend_mut("/a").methods.set(Method::POST, noop());
        right.descend_mut("/b").default = Some(noop());
        right.descend_mut("/:y/z");
        right.mux_mut().handle_boxed("/files/", noop());

        left.merge(right);

        let a = left.find_fixed("a").unwrap();
        assert_eq!(a.methods.allowed_methods(), vec![Method::GET, Method::POST]);
        assert!(left.find_fixed("b").unwrap().default.is_some());

        let dynamic = left.dynamic_child.as_deref().unwrap();
        assert_eq!(dynamic.aliases(), ["x".to_string(), "y".to_string()]);
        assert!(dynamic.find_fixed("z").is_some());
        assert!(left.mux.is_some());
    }
}
