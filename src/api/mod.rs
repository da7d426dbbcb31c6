pub mod attendance;
pub mod employee;
pub mod feedback;
pub mod session;
