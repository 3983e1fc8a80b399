use crate::api::attendance::{KioskResponse, KioskScan, RosterEntry, SetAttendance};
use crate::api::dashboard::DashboardSummary;
use crate::api::grades::{CreateGrade, GradeRow, MarksBySubject, SubjectScore};
use crate::api::leave_request::{ApplyLeave, HandleLeave, PendingLeave};
use crate::api::timetable::{Period, TimetableDay};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::role::Role;
use crate::models::{LoginReqDto, LoginResponse, SessionUser};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "School Portal API",
        version = "0.1.0",
        description = r#"
## School Attendance & Records Portal

Backend for the attendance kiosk and the student/teacher dashboards.

### 🔹 Key Features
- **Kiosk**
  - Mark today's attendance by scanning an RFID card
- **Students**
  - Dashboard summary, attendance history, marks by subject, timetable
  - Apply for leave and follow its status
- **Teachers**
  - Daily attendance roster, mark Present/Absent
  - Approve or reject pending leave
  - Record and browse grades

### 📦 Response Format
- JSON everywhere; errors are `{"message": "..."}`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::attendance::mark_attendance,
        crate::api::attendance::student_attendance,
        crate::api::attendance::daily_roster,
        crate::api::attendance::set_attendance,

        crate::api::dashboard::dashboard_summary,
        crate::api::timetable::timetable,

        crate::api::leave_request::apply_leave,
        crate::api::leave_request::student_leaves,
        crate::api::leave_request::pending_leaves,
        crate::api::leave_request::handle_leave,

        crate::api::grades::list_grades,
        crate::api::grades::create_grade,
        crate::api::grades::student_marks
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            SessionUser,
            Role,
            KioskScan,
            KioskResponse,
            RosterEntry,
            SetAttendance,
            AttendanceRecord,
            AttendanceStatus,
            DashboardSummary,
            Period,
            TimetableDay,
            ApplyLeave,
            HandleLeave,
            PendingLeave,
            LeaveRequest,
            LeaveStatus,
            CreateGrade,
            GradeRow,
            SubjectScore,
            MarksBySubject
        )
    ),
    tags(
        (name = "Auth", description = "Student and teacher login"),
        (name = "Attendance", description = "Kiosk attendance"),
        (name = "Student", description = "Student dashboard APIs"),
        (name = "Teacher", description = "Teacher attendance management"),
        (name = "Leave", description = "Leave applications and approvals"),
        (name = "Grades", description = "Marks and grades"),
    )
)]
pub struct ApiDoc;
