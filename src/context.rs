//! Scoped parsing depth.
//!
//! How deep the loader decodes packages is controlled by a thread-local stack of
//! [`ParsingDepth`] values. Code that needs more than the surrounding code asked for enters a
//! scope with a [`DepthRequest`]; everything fetched from the loader inside that scope is
//! decoded at least that deep, and already cached packages are upgraded in place. When the
//! scope ends the previous depth is restored. Packages are never downgraded.
//!
//! The outermost scope sets the depth: fields left unspecified in its request take the
//! default depth. Nested scopes can only add to the enclosing depth.
//!
//! # Examples
//!
//! ```rust
//! use uepkg::context::{DepthRequest, ParsingContext, ParsingDepth};
//!
//! assert_eq!(ParsingContext::current(), ParsingDepth::default());
//! {
//!     let _outer = ParsingContext::enter(DepthRequest::new().link(false));
//!     assert!(!ParsingContext::current().link);
//!     {
//!         let _inner = ParsingContext::enter(DepthRequest::new().link(true).bulk_data(true));
//!         assert!(ParsingContext::current().link);
//!         assert!(ParsingContext::current().bulk_data);
//!     }
//!     assert!(!ParsingContext::current().link);
//! }
//! assert_eq!(ParsingContext::current(), ParsingDepth::default());
//! ```

use std::{cell::RefCell, marker::PhantomData};

use crate::package::Stage;

thread_local! {
    static DEPTH_STACK: RefCell<Vec<ParsingDepth>> = const { RefCell::new(Vec::new()) };
}

/// Which decoding stages are wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParsingDepth {
    /// Resolve references
    pub link: bool,
    /// Decode tagged property lists
    pub properties: bool,
    /// Decode bulk data records
    pub bulk_data: bool,
}

impl Default for ParsingDepth {
    fn default() -> Self {
        ParsingDepth {
            link: true,
            properties: true,
            bulk_data: false,
        }
    }
}

impl ParsingDepth {
    /// Only the tables; nothing is linked or decoded.
    pub const TABLES: ParsingDepth = ParsingDepth {
        link: false,
        properties: false,
        bulk_data: false,
    };

    /// Every stage.
    pub const FULL: ParsingDepth = ParsingDepth {
        link: true,
        properties: true,
        bulk_data: true,
    };

    /// The stage a package must reach to satisfy this depth.
    ///
    /// Stages cannot be skipped: asking for properties without linking, or bulk data
    /// without properties, only gets as far as the last stage whose prerequisites are
    /// requested.
    #[must_use]
    pub fn target_stage(&self) -> Stage {
        match (self.link, self.properties, self.bulk_data) {
            (true, true, true) => Stage::BulkDataParsed,
            (true, true, false) => Stage::PropertiesParsed,
            (true, false, _) => Stage::Linked,
            (false, _, _) => Stage::Deserialized,
        }
    }

    /// Combines two depths, keeping every stage either of them wants.
    #[must_use]
    pub fn union(self, other: ParsingDepth) -> ParsingDepth {
        ParsingDepth {
            link: self.link || other.link,
            properties: self.properties || other.properties,
            bulk_data: self.bulk_data || other.bulk_data,
        }
    }
}

/// A request to change the parsing depth for a scope. Unset fields keep what applies
/// already.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DepthRequest {
    /// Resolve references
    pub link: Option<bool>,
    /// Decode tagged property lists
    pub properties: Option<bool>,
    /// Decode bulk data records
    pub bulk_data: Option<bool>,
}

impl DepthRequest {
    /// An empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request (or not) linking.
    #[must_use]
    pub fn link(mut self, link: bool) -> Self {
        self.link = Some(link);
        self
    }

    /// Request (or not) property decoding.
    #[must_use]
    pub fn properties(mut self, properties: bool) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Request (or not) bulk data decoding.
    #[must_use]
    pub fn bulk_data(mut self, bulk_data: bool) -> Self {
        self.bulk_data = Some(bulk_data);
        self
    }

    /// Applies this request as the outermost scope.
    #[must_use]
    pub fn over_default(self) -> ParsingDepth {
        let base = ParsingDepth::default();
        ParsingDepth {
            link: self.link.unwrap_or(base.link),
            properties: self.properties.unwrap_or(base.properties),
            bulk_data: self.bulk_data.unwrap_or(base.bulk_data),
        }
    }

    /// Applies this request inside a scope whose depth is `enclosing`.
    #[must_use]
    pub fn within(self, enclosing: ParsingDepth) -> ParsingDepth {
        ParsingDepth {
            link: enclosing.link || self.link.unwrap_or(false),
            properties: enclosing.properties || self.properties.unwrap_or(false),
            bulk_data: enclosing.bulk_data || self.bulk_data.unwrap_or(false),
        }
    }
}

impl From<ParsingDepth> for DepthRequest {
    fn from(depth: ParsingDepth) -> Self {
        DepthRequest {
            link: Some(depth.link),
            properties: Some(depth.properties),
            bulk_data: Some(depth.bulk_data),
        }
    }
}

/// Entry point to the thread-local depth stack.
pub struct ParsingContext;

impl ParsingContext {
    /// Enters a scope. The scope lasts until the returned guard is dropped.
    #[must_use = "the scope ends when the guard is dropped"]
    pub fn enter(request: impl Into<DepthRequest>) -> ParsingScope {
        let request = request.into();
        let (depth, level) = DEPTH_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let depth = match stack.last() {
                Some(&enclosing) => request.within(enclosing),
                None => request.over_default(),
            };
            stack.push(depth);
            (depth, stack.len())
        });

        ParsingScope {
            depth,
            level,
            _not_send: PhantomData,
        }
    }

    /// The depth in effect on this thread.
    #[must_use]
    pub fn current() -> ParsingDepth {
        DEPTH_STACK.with(|stack| stack.borrow().last().copied().unwrap_or_default())
    }

    /// Number of scopes currently entered on this thread.
    #[must_use]
    pub fn nesting() -> usize {
        DEPTH_STACK.with(|stack| stack.borrow().len())
    }
}

/// Guard of an entered scope; restores the enclosing depth when dropped.
///
/// The guard is tied to the thread that created it.
#[derive(Debug)]
pub struct ParsingScope {
    depth: ParsingDepth,
    level: usize,
    _not_send: PhantomData<*const ()>,
}

impl ParsingScope {
    /// The depth this scope established.
    #[must_use]
    pub fn depth(&self) -> ParsingDepth {
        self.depth
    }
}

impl Drop for ParsingScope {
    fn drop(&mut self) {
        DEPTH_STACK.with(|stack| {
            // Guards dropped out of order also pop every scope entered after them
            stack.borrow_mut().truncate(self.level - 1);
        });
    }
}

/// Runs `f` inside a scope with the requested depth.
pub fn with_parsing_depth<T>(request: impl Into<DepthRequest>, f: impl FnOnce() -> T) -> T {
    let _scope = ParsingContext::enter(request);
    f()
}
