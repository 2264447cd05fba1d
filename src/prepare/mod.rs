//! Page-preparation passes.
//!
//! Each pass talks to the page only through [`PageContext`](crate::PageContext)
//! and is driven in a fixed order by [`capture`](crate::capture::capture).
//!
//! - [`geometry`] - content bounding box
//! - [`stylesheet`] - flattened stylesheet and rule traversal
//! - [`endless_scroll`] - infinite-scroll detection
//! - [`mutation_guard`] - keeps force-loaded content in place
//! - [`scroll_to`] - scroll until a target height or timeout
//! - [`step_scroll`] - viewport-sized scrolling for lazy content
//! - [`layers`] - fixed overlay and z-index layer removal
//! - [`normalize`] - page-break and animation normalisation
//! - [`responsive`] - breakpoint-based capture width

pub mod endless_scroll;
pub mod geometry;
pub mod layers;
pub mod mutation_guard;
pub mod normalize;
pub mod responsive;
pub mod scroll_to;
pub mod step_scroll;
pub mod stylesheet;

pub use endless_scroll::{EndlessScrollCheck, NetworkActivityProbe};
pub use geometry::PageGeometry;
pub use layers::PositionedElement;
pub use mutation_guard::{ClassChurnFilter, GuardDecision, MutationGuard, RemovalPolicy};
pub use normalize::FreezeReport;
pub use scroll_to::{ScrollOutcome, ScrollTarget, ScrollToController};
pub use step_scroll::StepReport;
pub use stylesheet::{CssRule, StyleSheet, StyleSheetSet};
