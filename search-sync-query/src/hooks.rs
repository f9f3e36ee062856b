//! Extension points around query building and search execution.
//!
//! Each point is an ordered list of named callbacks that receive a mutable
//! event. Callbacks run in registration order and see the edits of the ones
//! before them.

use std::fmt;

use tracing::trace;

use search_sync_shared::{SearchQuery, SearchResponse};

use crate::filter::QueryFilterBuilder;

type Hook<E> = Box<dyn Fn(&mut E) + Send + Sync>;

/// Ordered callbacks for one extension point.
pub struct HookRegistry<E> {
    hooks: Vec<(String, Hook<E>)>,
}

impl<E> HookRegistry<E> {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    pub fn register<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        self.hooks.push((name.into(), Box::new(hook)));
    }

    pub fn fire(&self, event: &mut E) {
        for (name, hook) in &self.hooks {
            trace!(hook = %name, "Firing hook");
            hook(event);
        }
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl<E> Default for HookRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for HookRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|(name, _)| name))
            .finish()
    }
}

/// Fired before filter criteria are built; hooks may refine the builder.
#[derive(Debug)]
pub struct BuildQueryEvent {
    pub builder: QueryFilterBuilder,
}

/// Fired before the search reaches the engine.
///
/// Setting `skip_default` (or calling [`respond_with`](Self::respond_with))
/// bypasses the engine; `response` is then returned as is, or empty when no
/// hook supplied one.
#[derive(Debug)]
pub struct BeforeSearchEvent {
    pub query: SearchQuery,
    pub identity: String,
    pub skip_default: bool,
    pub response: Option<SearchResponse>,
}

impl BeforeSearchEvent {
    pub fn respond_with(&mut self, response: SearchResponse) {
        self.response = Some(response);
        self.skip_default = true;
    }
}

/// Fired after a response is available; hooks may rewrite it.
#[derive(Debug)]
pub struct AfterSearchEvent {
    pub query: SearchQuery,
    pub response: SearchResponse,
}

/// The registries consulted by the search service and filter building.
#[derive(Debug, Default)]
pub struct SearchHooks {
    pub build_query: HookRegistry<BuildQueryEvent>,
    pub before_search: HookRegistry<BeforeSearchEvent>,
    pub after_search: HookRegistry<AfterSearchEvent>,
}

impl SearchHooks {
    pub fn new() -> Self {
        Self::default()
    }
}
