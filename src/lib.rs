//! wxdash - Daily weather and air-quality dashboard for named places

pub mod api;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod present;

pub use dashboard::{Dashboard, Query, Session};
pub use error::{DashError, Result};
