pub mod engine;
mod forest;
mod graph;
mod navigation;
mod recalc;
pub mod tab_bar;

pub use engine::{
    ExpandFullscreenOption, ExpandOption, FocusShift, GroupChange, LayoutCommand, LayoutEngine,
    SetSwallowOption, TabFocus, TabFocusMousePriority,
};
pub use forest::{Detached, Forest, LayoutCx, NodeSnapshot};
pub use graph::{Direction, Orientation};
pub use navigation::{
    Distance, FocusOverrides, is_obscured, shift_floating_window, window_in_direction,
};
pub use tab_bar::{TabBar, TabBarId, TabBars, TabEntry};
