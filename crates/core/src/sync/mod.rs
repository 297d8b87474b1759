//! Offline synchronization: coordinator, ports, guard, and policy gate

pub mod coordinator;
pub mod errors;
pub mod gate;
pub mod guard;
pub mod ports;
