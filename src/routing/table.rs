//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes for one dispatch purpose
//! - Find the best matching route for a request method and resource
//! - Return the matched entry or an explicit no-match (`None`)
//!
//! # Design Decisions
//! - Entries keep registration order; lookup scans and compares priorities
//! - Highest priority wins; equal priorities resolve to the earliest
//!   registered entry
//! - Priority is computed once, when the entry is registered
//! - Read-only after startup, safe to share across request threads

use crate::routing::matcher;
use crate::routing::resource::PathResource;
use crate::routing::template::UriTemplate;

/// One registered route.
#[derive(Debug, Clone)]
pub struct RouteEntry<H> {
    pub template: UriTemplate,
    pub handler: H,
    pub priority: i32,
}

impl<H> RouteEntry<H> {
    /// Whether this entry accepts the request method and resource.
    pub fn accepts(&self, method: &str, resource: &PathResource) -> bool {
        self.template.method().accepts(method) && matcher::matches(resource, &self.template)
    }
}

/// Ordered collection of routes.
#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    entries: Vec<RouteEntry<H>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Registering a route whose method overlaps and whose
    /// segment shape equals an existing one is allowed but logged: for the
    /// shared methods the later route can never be selected.
    pub fn register(&mut self, template: UriTemplate, handler: H) -> &RouteEntry<H> {
        if let Some(existing) = self.shadowing(&template) {
            tracing::warn!(
                existing = %existing.template,
                shadowed = %template,
                method = %template.method(),
                "Route is shadowed by an earlier registration"
            );
        }

        let priority = template.priority();
        let index = self.entries.len();
        self.entries.push(RouteEntry {
            template,
            handler,
            priority,
        });
        &self.entries[index]
    }

    /// The earlier entry that would win every request `template` could
    /// answer for their shared methods.
    pub fn shadowing(&self, template: &UriTemplate) -> Option<&RouteEntry<H>> {
        self.entries
            .iter()
            .find(|entry| entry.template.same_shape(template))
    }

    /// The best matching entry, or `None` when nothing matches.
    pub fn resolve(&self, method: &str, resource: &PathResource) -> Option<&RouteEntry<H>> {
        let mut best: Option<&RouteEntry<H>> = None;
        for entry in self.entries.iter().filter(|e| e.accepts(method, resource)) {
            // Strict comparison keeps the earliest entry on ties.
            if best.is_none_or(|b| entry.priority > b.priority) {
                best = Some(entry);
            }
        }
        best
    }

    /// Every matching entry, best first. Ties keep registration order.
    pub fn candidates(&self, method: &str, resource: &PathResource) -> Vec<&RouteEntry<H>> {
        let mut found: Vec<_> = self
            .entries
            .iter()
            .filter(|e| e.accepts(method, resource))
            .collect();
        found.sort_by(|a, b| b.priority.cmp(&a.priority));
        found
    }

    pub fn entries(&self) -> &[RouteEntry<H>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
