// Call-based acknowledgment of primary alerts.
//
// - model.rs: Call states, attempts, notices and settings
// - monitor.rs: Call-state stream -> call-end detection
// - coordinator.rs: Place/redial protocol
// - dialer.rs: Call capability and pre-call hook

pub mod coordinator;
pub mod dialer;
pub mod model;
pub mod monitor;
