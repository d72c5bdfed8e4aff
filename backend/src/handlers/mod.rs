//! HTTP request handlers

pub mod activity;
pub mod health;
pub mod notification;
pub mod project;
pub mod stock;

pub use activity::*;
pub use health::*;
pub use notification::*;
pub use project::*;
pub use stock::*;
