//! Retained-mode scene graph
//!
//! A [`Scene`] owns a [`SceneGraph`]: an arena [`ControlTree`] of panels,
//! labels, buttons and images with dirty tracking, plus the touch routing
//! state. The [`SceneManager`] keeps exactly one scene active and switches
//! between them by id.

pub mod control;
pub mod graph;
pub mod manager;
pub mod style;
pub mod widget;

pub use control::{Control, ControlId, ControlTree, TouchOutcome};
pub use graph::SceneGraph;
pub use manager::{Scene, SceneContext, SceneEvent, SceneFactory, SceneManager};
pub use style::{ControlState, Padding, Style, Styles};
pub use widget::{Button, Image, Label, TextAlign, TextSize, Widget};

/// Numeric scene identifier.
pub type SceneId = u32;

/// Something a control asks the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Switch to another scene
    SetActiveScene(SceneId),
    /// Return to the previously active scene
    GoBack,
    /// Application-defined action code
    Custom(u16),
}
