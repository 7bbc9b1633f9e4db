//! Parser events - the output of the reader.
//!
//! This is a SAX-style event model: the reader calls an [`EventSink`] as it
//! recognizes structure, with no accumulation. Structure is represented by
//! start/end pairs nested in this order:
//!
//! ```text
//! ediroot
//! └── interchange
//!     ├── sender / receiver ── address
//!     └── group (X12 always, EDIFACT/TRADACOMS optionally)
//!         └── transaction
//!             └── loop (zero or more levels, from loop tables)
//!                 └── segment
//!                     └── element
//!                         └── subelement
//!                             └── subsubelement
//! ```
//!
//! Element values arrive as [`EventSink::characters`] between the start and
//! end of their element.

use crate::attributes::Attributes;
use crate::details::ClosingDetails;
use serde::Serialize;

/// Element names used in events.
pub mod names {
    pub const ROOT: &str = "ediroot";
    pub const INTERCHANGE: &str = "interchange";
    pub const SENDER: &str = "sender";
    pub const RECEIVER: &str = "receiver";
    pub const ADDRESS: &str = "address";
    pub const GROUP: &str = "group";
    pub const TRANSACTION: &str = "transaction";
    pub const LOOP: &str = "loop";
    pub const SEGMENT: &str = "segment";
    pub const ELEMENT: &str = "element";
    pub const SUB_ELEMENT: &str = "subelement";
    pub const SUB_SUB_ELEMENT: &str = "subsubelement";
}

/// Receives events in input order.
///
/// Callbacks must not re-enter the reader that is calling them.
pub trait EventSink {
    fn start_document(&mut self) {}

    fn end_document(&mut self) {}

    fn start_element(&mut self, name: &str, attributes: &Attributes);

    fn end_element(&mut self, name: &str);

    fn characters(&mut self, text: &str);

    /// Called after each document and each interchange closes.
    fn closed(&mut self, _details: &ClosingDetails) {}
}

impl<K: EventSink + ?Sized> EventSink for &mut K {
    fn start_document(&mut self) {
        (**self).start_document();
    }

    fn end_document(&mut self) {
        (**self).end_document();
    }

    fn start_element(&mut self, name: &str, attributes: &Attributes) {
        (**self).start_element(name, attributes);
    }

    fn end_element(&mut self, name: &str) {
        (**self).end_element(name);
    }

    fn characters(&mut self, text: &str) {
        (**self).characters(text);
    }

    fn closed(&mut self, details: &ClosingDetails) {
        (**self).closed(details);
    }
}

/// An owned event, as recorded by [`EventCollector`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    StartDocument,
    EndDocument,
    Start {
        name: String,
        attributes: Attributes,
    },
    End {
        name: String,
    },
    Text {
        text: String,
    },
}

impl Event {
    /// The element name of a start or end event.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Event::Start { name, .. } | Event::End { name } => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_start_of(&self, element: &str) -> bool {
        matches!(self, Event::Start { name, .. } if name == element)
    }

    #[must_use]
    pub fn is_end_of(&self, element: &str) -> bool {
        matches!(self, Event::End { name } if name == element)
    }
}

/// An [`EventSink`] that records everything it receives.
///
/// # Examples
///
/// ```rust
/// use edi_stream::{Attributes, EventCollector, EventSink};
///
/// let mut sink = EventCollector::new();
/// sink.start_element("segment", &Attributes::new());
/// sink.end_element("segment");
/// assert_eq!(sink.events.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventCollector {
    pub events: Vec<Event>,
    pub closings: Vec<ClosingDetails>,
}

impl EventCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start events for elements named `name`, in order.
    pub fn starts<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Attributes> + 'a {
        self.events.iter().filter_map(move |event| match event {
            Event::Start {
                name: n,
                attributes,
            } if n == name => Some(attributes),
            _ => None,
        })
    }

    /// Number of start events for elements named `name`.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.starts(name).count()
    }

    /// An indented outline of the envelope, loop and segment structure.
    ///
    /// Loops print as `loop:<Id>` and segments as `segment:<Id>`; elements
    /// and party addresses are left out.
    #[must_use]
    pub fn outline(&self) -> String {
        const HIDDEN: [&str; 6] = [
            names::ELEMENT,
            names::SUB_ELEMENT,
            names::SUB_SUB_ELEMENT,
            names::SENDER,
            names::RECEIVER,
            names::ADDRESS,
        ];
        let mut out = String::new();
        let mut open: Vec<bool> = Vec::new();
        for event in &self.events {
            match event {
                Event::Start { name, attributes } => {
                    let shown = !HIDDEN.contains(&name.as_str());
                    if shown {
                        let depth = open.iter().filter(|shown| **shown).count();
                        out.push_str(&"  ".repeat(depth));
                        out.push_str(name);
                        if name == names::LOOP || name == names::SEGMENT {
                            if let Some(id) = attributes.get("Id") {
                                out.push(':');
                                out.push_str(id);
                            }
                        }
                        out.push('\n');
                    }
                    open.push(shown);
                }
                Event::End { .. } => {
                    open.pop();
                }
                _ => {}
            }
        }
        out
    }
}

impl EventSink for EventCollector {
    fn start_document(&mut self) {
        self.events.push(Event::StartDocument);
    }

    fn end_document(&mut self) {
        self.events.push(Event::EndDocument);
    }

    fn start_element(&mut self, name: &str, attributes: &Attributes) {
        self.events.push(Event::Start {
            name: name.to_string(),
            attributes: attributes.clone(),
        });
    }

    fn end_element(&mut self, name: &str) {
        self.events.push(Event::End {
            name: name.to_string(),
        });
    }

    fn characters(&mut self, text: &str) {
        self.events.push(Event::Text {
            text: text.to_string(),
        });
    }

    fn closed(&mut self, details: &ClosingDetails) {
        self.closings.push(details.clone());
    }
}
