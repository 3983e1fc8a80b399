pub mod attendance;
pub mod dashboard;
pub mod grades;
pub mod leave_request;
pub mod timetable;
