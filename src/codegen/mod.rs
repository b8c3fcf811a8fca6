//! # Widget Code Generation
//!
//! ESPHome LVGL fragments from SquareLine widget trees.

pub mod actions;
pub mod node_handlers;
pub mod style;
mod widget_codegen;

pub use widget_codegen::*;
