//! Business logic services for the Farm Management Platform

pub mod activity;
pub mod notification;
pub mod project;
pub mod stock;

pub use activity::ActivityService;
pub use notification::NotificationService;
pub use project::ProjectService;
pub use stock::StockService;
