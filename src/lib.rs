//! Portfolio records: query composition, table stores, list and dialog
//! state machines, and the year timeline scroll-spy.

pub mod config;
pub mod list;
pub mod modal;
pub mod model;
pub mod nav;
pub mod query;
pub mod scrollspy;
pub mod store;
