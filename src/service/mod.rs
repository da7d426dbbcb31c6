pub mod error;
pub mod feedback;
pub mod history;
pub mod lifecycle;
pub mod streak;
