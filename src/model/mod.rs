pub mod actor;
pub mod attendance;
pub mod employee;
pub mod role;
pub mod session;
pub mod user;
