//! Configuration options for reading interchanges.
//!
//! - [`ReaderOptions`]: tokenizer limits, value trimming, text retention and
//!   the loop tables consulted inside documents.
//!
//! ## Examples
//!
//! ```rust
//! use edi_stream::{loop_table, PluginRegistry, ReaderOptions, Standard};
//!
//! let mut plugins = PluginRegistry::new();
//! plugins.register(
//!     Standard::X12,
//!     "850",
//!     loop_table![("N1", "N1", 1, "*"), ("PO1", "PO1", 1, "*")],
//! );
//!
//! let options = ReaderOptions::new()
//!     .with_max_element_length(1024)
//!     .with_retain_text(true)
//!     .with_plugins(plugins);
//! assert!(options.retain_text);
//! ```

use crate::plugin::PluginRegistry;
use std::sync::Arc;

/// Configuration for a [`Reader`](crate::Reader) and its tokenizer.
#[derive(Clone, Debug)]
pub struct ReaderOptions {
    /// Trim blanks around element values.
    pub trim_values: bool,
    /// Longest element accepted before the delimiters are presumed wrong.
    pub max_element_length: usize,
    /// Characters buffered before the tokenizer compacts its buffer.
    pub buffer_capacity: usize,
    /// Keep consumed text so spans can be echoed verbatim.
    pub retain_text: bool,
    pub plugins: Arc<PluginRegistry>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            trim_values: true,
            max_element_length: 8192,
            buffer_capacity: 4096,
            retain_text: false,
            plugins: Arc::new(PluginRegistry::new()),
        }
    }
}

impl ReaderOptions {
    /// Creates default options: trimming on, 8192-character elements,
    /// a 4096-character buffer, no text retention and no loop tables.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use edi_stream::ReaderOptions;
    ///
    /// let options = ReaderOptions::new();
    /// assert!(options.trim_values);
    /// assert_eq!(options.max_element_length, 8192);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_trim_values(mut self, trim: bool) -> Self {
        self.trim_values = trim;
        self
    }

    /// Sets the element length limit.
    ///
    /// A longer element fails with [`Error::ElementTooLong`](crate::Error::ElementTooLong),
    /// which usually means the delimiter set is not the one the sender used.
    #[must_use]
    pub fn with_max_element_length(mut self, limit: usize) -> Self {
        self.max_element_length = limit;
        self
    }

    #[must_use]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Keeps a transcript of consumed characters.
    ///
    /// Required for [`Reader::raw_text`](crate::Reader::raw_text).
    #[must_use]
    pub fn with_retain_text(mut self, retain: bool) -> Self {
        self.retain_text = retain;
        self
    }

    /// Sets the loop tables. They are shared, read-only, across readers.
    #[must_use]
    pub fn with_plugins(mut self, plugins: impl Into<Arc<PluginRegistry>>) -> Self {
        self.plugins = plugins.into();
        self
    }
}
