//! Request middleware.

pub mod widget;

pub use widget::{Widget, widget_middleware};
