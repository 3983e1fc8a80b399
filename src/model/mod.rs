pub mod attendance;
pub mod leave_request;
pub mod mark;
pub mod role;
pub mod student;
