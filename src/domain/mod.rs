//! Domain types and the ports the application layer talks through.

pub mod card;
pub mod credential;
pub mod ports;
pub mod role;
pub mod transaction;
