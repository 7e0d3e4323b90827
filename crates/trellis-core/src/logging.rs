//! Logging and debugging facilities for Trellis.
//!
//! This module provides:
//! - Target and span name constants for the `tracing` integration
//! - Prefix helpers for rendering widget trees as debug text
//! - Performance spans for profiling layout and notification passes
//!
//! # Tracing Integration
//!
//! Trellis uses the `tracing` crate for instrumentation. Nothing is printed
//! unless the application installs a subscriber:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("trellis::layout=trace,trellis_core::data=debug")
//!         .init();
//! }
//! ```

/// Span names used throughout Trellis for tracing.
///
/// These constants can be used to filter traces for specific subsystems.
pub mod span_names {
    /// Observer fan-out span.
    pub const NOTIFY: &str = "trellis::notify";
    /// Scoped re-layout span.
    pub const RELAYOUT: &str = "trellis::relayout";
    /// Event dispatch span.
    pub const DISPATCH: &str = "trellis::dispatch";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "trellis_core";
    /// Data object and observer target.
    pub const DATA: &str = "trellis_core::data";
    /// Type registry target.
    pub const REGISTRY: &str = "trellis_core::registry";
    /// Signal/slot target.
    pub const SIGNAL: &str = "trellis_core::signal";
    /// Widget tree lifecycle target.
    pub const TREE: &str = "trellis::tree";
    /// Geometry negotiation target.
    pub const LAYOUT: &str = "trellis::layout";
    /// Accelerator table target.
    pub const ACCEL: &str = "trellis::accel";
    /// Event routing target.
    pub const EVENT: &str = "trellis::event";
    /// Configuration loading target.
    pub const CONFIG: &str = "trellis::config";
    /// Performance span target.
    pub const PERF: &str = "trellis::perf";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node ids.
    pub show_ids: bool,
    /// Whether to show flag sets.
    pub show_flags: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: false,
            show_flags: true,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Options that include ids and flags.
    pub fn detailed() -> Self {
        Self {
            show_ids: true,
            ..Self::default()
        }
    }

    /// Options that print only kind names.
    pub fn minimal() -> Self {
        Self {
            style: TreeStyle::Compact,
            show_flags: false,
            ..Self::default()
        }
    }

    /// Build the prefix string for a tree node at `depth`.
    pub fn prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, tee, corner) = match self.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            for _ in 0..self.indent_size {
                prefix.push(' ');
            }
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix.push(' ');
        prefix
    }
}

/// A guard that emits a tracing span when dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// Macros for common tracing patterns.
///
/// These are thin wrappers around the `tracing` macros with a fixed target.
#[macro_export]
macro_rules! trellis_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: $crate::logging::targets::CORE, $($arg)*)
    };
}

#[macro_export]
macro_rules! trellis_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: $crate::logging::targets::CORE, $($arg)*)
    };
}

#[macro_export]
macro_rules! trellis_info {
    ($($arg:tt)*) => {
        tracing::info!(target: $crate::logging::targets::CORE, $($arg)*)
    };
}

#[macro_export]
macro_rules! trellis_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: $crate::logging::targets::CORE, $($arg)*)
    };
}

#[macro_export]
macro_rules! trellis_error {
    ($($arg:tt)*) => {
        tracing::error!(target: $crate::logging::targets::CORE, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    use super::*;

    /// Records the target of every span and event.
    #[derive(Clone, Default)]
    struct SeenTargets(Arc<Mutex<Vec<String>>>);

    impl<S: tracing::Subscriber> Layer<S> for SeenTargets {
        fn on_new_span(&self, attrs: &tracing::span::Attributes<'_>, _id: &tracing::span::Id, _cx: Context<'_, S>) {
            self.0.lock().push(attrs.metadata().target().to_owned());
        }

        fn on_event(&self, event: &tracing::Event<'_>, _cx: Context<'_, S>) {
            self.0.lock().push(event.metadata().target().to_owned());
        }
    }

    #[test]
    fn test_prefix_root_is_empty() {
        let options = TreeFormatOptions::default();
        assert_eq!(options.prefix(0, true), "");
    }

    #[test]
    fn test_prefix_ascii_nesting() {
        let options = TreeFormatOptions {
            style: TreeStyle::Ascii,
            ..TreeFormatOptions::default()
        };
        assert_eq!(options.prefix(1, false), "+-- ");
        assert_eq!(options.prefix(2, true), "|  `-- ");
    }

    #[test]
    fn test_perf_span_without_subscriber() {
        let _span = PerfSpan::new("layout");
        trellis_debug!(pass = "request", "inside perf span");
    }

    #[test]
    fn test_spans_and_macros_use_subsystem_targets() {
        let seen = SeenTargets::default();
        let subscriber = tracing_subscriber::registry().with(seen.clone());
        tracing::subscriber::with_default(subscriber, || {
            let _span = PerfSpan::new("layout");
            trellis_warn!("inside perf span");
        });

        let seen = seen.0.lock();
        assert!(seen.iter().any(|target| target == targets::PERF));
        assert!(seen.iter().any(|target| target == targets::CORE));
    }
}
