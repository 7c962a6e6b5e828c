//! Commands
//!
//! The dashboard service the application shell talks to.

mod dashboard;


pub use dashboard::{Dashboard, LoadStatus};
