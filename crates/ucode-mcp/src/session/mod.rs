//! Session management: one protocol engine per client session.

pub mod manager;

pub use manager::{Session, SessionBinding, SessionManager};
