//! Driving a live page: the session, element actions and bounded waits.

pub mod act;
pub mod session;
pub mod wait;
