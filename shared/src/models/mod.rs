//! Domain models for the Farm Management Platform

pub mod activity;
pub mod notification;
pub mod project;
pub mod stock;

pub use activity::*;
pub use notification::*;
pub use project::*;
pub use stock::*;
