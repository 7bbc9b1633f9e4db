//! Loop tables and the loop controller.
//!
//! EDI documents have no delimiters for loops: whether an `N1` starts a new
//! party loop or a `PID` nests under the current line item is known only
//! from the transaction set's definition. Callers supply that knowledge as
//! one [`LoopTable`] per document type, registered in a [`PluginRegistry`].
//!
//! Inside a document the reader asks a [`LoopController`] about every data
//! segment before emitting it. The controller keeps an explicit stack of
//! open loops and emits loop start/end events so they interleave correctly
//! with segment events.
//!
//! ## Rule semantics
//!
//! Each [`LoopDescriptor`] is `(loop name, segment, level, context)`:
//!
//! - A named rule closes every open loop at `level` or deeper, then opens
//!   the named loop at `level`.
//! - The name `"."` does the same but opens an anonymous frame that emits no
//!   events and adds nothing to the context path.
//! - No name closes every loop deeper than `level` and opens nothing.
//!
//! A rule applies when its context is the current path (`/PO1/SLN`), an
//! ancestor of it (`/PO1`), or the wildcard `*`. Exact matches win over
//! ancestors, ancestors over wildcards, and the table's declaration order
//! breaks ties.
//!
//! ## Examples
//!
//! ```rust
//! use edi_stream::{loop_table, EventCollector, LoopController};
//! use std::sync::Arc;
//!
//! let table = Arc::new(loop_table![
//!     ("PO1", "PO1", 1, "*"),
//!     ("PID", "PID", 2, "/PO1"),
//!     (None, "CTT", 0, "*"),
//! ]);
//! let mut sink = EventCollector::new();
//! let mut loops = LoopController::new(Some(table));
//!
//! assert!(loops.transition("PO1", &mut sink));
//! assert!(loops.transition("PID", &mut sink));
//! assert_eq!(loops.path(), "/PO1/PID");
//! assert!(loops.transition("CTT", &mut sink));
//! assert_eq!(loops.path(), "/");
//! ```

use crate::attributes::Attributes;
use crate::detect::Standard;
use crate::event::{names, EventSink};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Context that matches wherever the reader is.
pub const ANY_CONTEXT: &str = "*";

/// Loop name for an anonymous boundary frame.
pub const ANONYMOUS_LOOP: &str = ".";

const ROOT_PATH: &str = "/";

fn any_context() -> String {
    ANY_CONTEXT.to_string()
}

/// One loop rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopDescriptor {
    pub loop_name: Option<String>,
    pub segment: String,
    pub level: usize,
    #[serde(default = "any_context")]
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ContextMatch {
    Wildcard,
    Ancestor,
    Exact,
}

impl LoopDescriptor {
    pub fn new(loop_name: Option<&str>, segment: &str, level: usize, context: &str) -> Self {
        LoopDescriptor {
            loop_name: loop_name.map(str::to_string),
            segment: segment.to_string(),
            level,
            context: context.to_string(),
        }
    }

    fn context_match(&self, path: &str) -> Option<ContextMatch> {
        if self.context == ANY_CONTEXT {
            return Some(ContextMatch::Wildcard);
        }
        let context = match self.context.trim_end_matches('/') {
            "" => ROOT_PATH,
            trimmed => trimmed,
        };
        if context == path {
            Some(ContextMatch::Exact)
        } else if context == ROOT_PATH
            || (path.starts_with(context) && path[context.len()..].starts_with('/'))
        {
            Some(ContextMatch::Ancestor)
        } else {
            None
        }
    }
}

/// An ordered set of loop rules for one document type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoopTable {
    descriptors: Vec<LoopDescriptor>,
}

impl LoopTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, descriptor: LoopDescriptor) {
        self.descriptors.push(descriptor);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LoopDescriptor> {
        self.descriptors.iter()
    }

    /// The rule that applies to `segment` at `path`, if any.
    #[must_use]
    pub fn select(&self, segment: &str, path: &str) -> Option<&LoopDescriptor> {
        let mut best: Option<(ContextMatch, &LoopDescriptor)> = None;
        for descriptor in self.descriptors.iter().filter(|d| d.segment == segment) {
            if let Some(quality) = descriptor.context_match(path) {
                if best.map_or(true, |(current, _)| quality > current) {
                    best = Some((quality, descriptor));
                }
            }
        }
        best.map(|(_, descriptor)| descriptor)
    }
}

impl FromIterator<LoopDescriptor> for LoopTable {
    fn from_iter<T: IntoIterator<Item = LoopDescriptor>>(iter: T) -> Self {
        LoopTable {
            descriptors: iter.into_iter().collect(),
        }
    }
}

/// Loop tables keyed by standard and document type.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    tables: IndexMap<(Standard, String), Arc<LoopTable>>,
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the table for a document type.
    pub fn register(&mut self, standard: Standard, document_type: &str, table: LoopTable) {
        self.tables
            .insert((standard, document_type.to_string()), Arc::new(table));
    }

    #[must_use]
    pub fn table(&self, standard: Standard, document_type: &str) -> Option<Arc<LoopTable>> {
        self.tables
            .get(&(standard, document_type.to_string()))
            .cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[derive(Debug, Clone)]
struct Frame {
    name: Option<String>,
    level: usize,
}

/// Nests a document's segments into loops.
///
/// Without a table the controller passes every segment through untouched.
#[derive(Debug, Default)]
pub struct LoopController {
    table: Option<Arc<LoopTable>>,
    stack: Vec<Frame>,
    path: String,
}

impl LoopController {
    pub fn new(table: Option<Arc<LoopTable>>) -> Self {
        LoopController {
            table,
            stack: Vec::new(),
            path: ROOT_PATH.to_string(),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.table.is_some()
    }

    /// Number of open frames, anonymous ones included.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// `/`-separated names of the open named loops; `/` at document level.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Names of the open named loops, outermost first.
    pub fn open_loops(&self) -> impl Iterator<Item = &str> {
        self.stack.iter().filter_map(|frame| frame.name.as_deref())
    }

    /// Applies the table to an incoming segment.
    ///
    /// Returns `true` if any loop was opened or closed.
    pub fn transition<K: EventSink + ?Sized>(&mut self, segment_id: &str, sink: &mut K) -> bool {
        let Some(table) = self.table.clone() else {
            return false;
        };
        let Some(rule) = table.select(segment_id, &self.path) else {
            return false;
        };
        let level = rule.level;
        let changed = match rule.loop_name.as_deref() {
            None => self.pop_deeper_than(level, sink) > 0,
            Some(ANONYMOUS_LOOP) => {
                self.pop_deeper_than(level.saturating_sub(1), sink);
                tracing::trace!(segment = segment_id, level, "anonymous loop frame");
                self.stack.push(Frame { name: None, level });
                true
            }
            Some(name) => {
                self.pop_deeper_than(level.saturating_sub(1), sink);
                tracing::trace!(segment = segment_id, name, level, "loop start");
                let mut attributes = Attributes::with_capacity(1);
                attributes.insert("Id", name);
                sink.start_element(names::LOOP, &attributes);
                self.stack.push(Frame {
                    name: Some(name.to_string()),
                    level,
                });
                true
            }
        };
        if changed {
            self.render_path();
        }
        changed
    }

    /// Closes every open loop, deepest first.
    pub fn close_all<K: EventSink + ?Sized>(&mut self, sink: &mut K) {
        while let Some(frame) = self.stack.pop() {
            Self::end_frame(frame, sink);
        }
        self.render_path();
    }

    fn pop_deeper_than<K: EventSink + ?Sized>(&mut self, level: usize, sink: &mut K) -> usize {
        let mut popped = 0;
        while self.stack.last().is_some_and(|frame| frame.level > level) {
            if let Some(frame) = self.stack.pop() {
                Self::end_frame(frame, sink);
                popped += 1;
            }
        }
        popped
    }

    fn end_frame<K: EventSink + ?Sized>(frame: Frame, sink: &mut K) {
        if let Some(name) = frame.name {
            tracing::trace!(name = %name, level = frame.level, "loop end");
            sink.end_element(names::LOOP);
        }
    }

    fn render_path(&mut self) {
        self.path.clear();
        for name in self.stack.iter().filter_map(|frame| frame.name.as_deref()) {
            self.path.push('/');
            self.path.push_str(name);
        }
        if self.path.is_empty() {
            self.path.push_str(ROOT_PATH);
        }
    }
}
