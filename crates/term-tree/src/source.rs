//! Lazy node source.
//!
//! This module defines the `NodeSource` trait which abstracts over the
//! endpoint that serves a node's children, plus `StaticSource`, an
//! in-memory implementation used by hosts without a live endpoint and by
//! tests.

use crate::tree::NodeDescriptor;
use anyhow::{anyhow, Result};
use futures::future::{self, FutureExt, LocalBoxFuture};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Key of a child fetch: the parent's key and whether that key names a
/// vocabulary rather than a term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChildRequest {
    pub parent: String,
    #[serde(default)]
    pub vocab: bool,
}

impl ChildRequest {
    pub fn new(parent: impl Into<String>, vocab: bool) -> Self {
        Self {
            parent: parent.into(),
            vocab,
        }
    }

    /// Request for the root terms of a vocabulary
    pub fn vocabulary(vid: impl Into<String>) -> Self {
        Self::new(vid, true)
    }

    /// Request for the child terms of a term
    pub fn term(tid: impl Into<String>) -> Self {
        Self::new(tid, false)
    }

    /// Query string understood by the subtree endpoint, `parent` percent-encoded
    pub fn query(&self) -> String {
        format!(
            "parent={}&vocab={}",
            urlencoding::encode(&self.parent),
            self.vocab
        )
    }
}

/// Resolves a node's children on demand.
///
/// The returned list is in display order and empty when the parent has no
/// children. An `Err` means the fetch failed; callers must not apply any
/// partial result.
///
/// # Example
///
/// ```ignore
/// struct Endpoint { client: HttpClient }
///
/// impl NodeSource for Endpoint {
///     fn fetch_children(&self, request: &ChildRequest)
///         -> LocalBoxFuture<'_, Result<Vec<NodeDescriptor>>>
///     {
///         let url = format!("/term_reference_fancytree/subTree?{}", request.query());
///         async move { self.client.get_json(&url).await }.boxed_local()
///     }
/// }
/// ```
pub trait NodeSource {
    fn fetch_children(
        &self,
        request: &ChildRequest,
    ) -> LocalBoxFuture<'_, Result<Vec<NodeDescriptor>>>;
}

impl<T: NodeSource + ?Sized> NodeSource for &T {
    fn fetch_children(
        &self,
        request: &ChildRequest,
    ) -> LocalBoxFuture<'_, Result<Vec<NodeDescriptor>>> {
        (**self).fetch_children(request)
    }
}

impl<T: NodeSource + ?Sized> NodeSource for Rc<T> {
    fn fetch_children(
        &self,
        request: &ChildRequest,
    ) -> LocalBoxFuture<'_, Result<Vec<NodeDescriptor>>> {
        (**self).fetch_children(request)
    }
}

/// One entry of a fixture file: the children served for a request, or the
/// error it fails with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureEntry {
    pub parent: String,
    #[serde(default)]
    pub vocab: bool,
    #[serde(default)]
    pub children: Vec<NodeDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// In-memory node source
///
/// Requests without a registered entry resolve to no children. Every
/// request is recorded and can be inspected with [`StaticSource::requests`].
#[derive(Debug, Default)]
pub struct StaticSource {
    children: HashMap<ChildRequest, Vec<NodeDescriptor>>,
    failures: HashMap<ChildRequest, String>,
    requests: RefCell<Vec<ChildRequest>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a source from fixture entries
    pub fn from_fixture(entries: Vec<FixtureEntry>) -> Self {
        entries.into_iter().fold(Self::new(), |source, entry| {
            let request = ChildRequest::new(entry.parent, entry.vocab);
            match entry.error {
                Some(message) => source.with_failure(request, message),
                None => source.with_children(request, entry.children),
            }
        })
    }

    /// Serve `children` for `request`
    pub fn with_children(mut self, request: ChildRequest, children: Vec<NodeDescriptor>) -> Self {
        self.insert(request, children);
        self
    }

    /// Fail every fetch for `request` with `message`
    pub fn with_failure(mut self, request: ChildRequest, message: impl Into<String>) -> Self {
        self.failures.insert(request, message.into());
        self
    }

    pub fn insert(&mut self, request: ChildRequest, children: Vec<NodeDescriptor>) {
        self.failures.remove(&request);
        self.children.insert(request, children);
    }

    /// Requests served so far, in order
    pub fn requests(&self) -> Vec<ChildRequest> {
        self.requests.borrow().clone()
    }
}

impl NodeSource for StaticSource {
    fn fetch_children(
        &self,
        request: &ChildRequest,
    ) -> LocalBoxFuture<'_, Result<Vec<NodeDescriptor>>> {
        debug!("Fetching children: {}", request.query());
        self.requests.borrow_mut().push(request.clone());

        let result = match self.failures.get(request) {
            Some(message) => Err(anyhow!("{message} ({})", request.query())),
            None => Ok(self.children.get(request).cloned().unwrap_or_default()),
        };
        future::ready(result).boxed_local()
    }
}
