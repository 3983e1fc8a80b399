use actix_web::{HttpResponse, Responder};
use once_cell::sync::Lazy;
use serde::Serialize;
use utoipa::ToSchema;

const FIRST_PERIOD_HOUR: usize = 9;

const WEEK: [(&str, [&str; 5]); 6] = [
    ("Monday", ["Mathematics", "Science", "English", "History", "Physical Education"]),
    ("Tuesday", ["English", "Mathematics", "Geography", "Science", "Art"]),
    ("Wednesday", ["Science", "English", "Mathematics", "Computer Science", "Music"]),
    ("Thursday", ["History", "Mathematics", "Science", "English", "Library"]),
    ("Friday", ["English", "Science", "Mathematics", "Geography", "Sports"]),
    ("Saturday", ["Mathematics", "English", "Science", "Project Work", "Free Period"]),
];

#[derive(Debug, Serialize, ToSchema)]
pub struct Period {
    #[schema(example = 1)]
    pub period: usize,
    #[schema(example = "Mathematics", value_type = String)]
    pub subject: &'static str,
    #[schema(example = "9:00 - 10:00")]
    pub time: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TimetableDay {
    #[schema(example = "Monday", value_type = String)]
    pub day: &'static str,
    pub periods: Vec<Period>,
}

static TIMETABLE: Lazy<Vec<TimetableDay>> = Lazy::new(|| {
    WEEK.iter()
        .map(|&(day, subjects)| TimetableDay {
            day,
            periods: subjects
                .iter()
                .enumerate()
                .map(|(index, &subject)| {
                    let start = FIRST_PERIOD_HOUR + index;
                    Period {
                        period: index + 1,
                        subject,
                        time: format!("{}:00 - {}:00", start, start + 1),
                    }
                })
                .collect(),
        })
        .collect()
});

/// Weekly class timetable
#[utoipa::path(
    get,
    path = "/api/student/timetable",
    responses(
        (status = 200, description = "Monday to Saturday, five periods a day", body = [TimetableDay])
    ),
    tag = "Student"
)]
pub async fn timetable() -> impl Responder {
    HttpResponse::Ok().json(&*TIMETABLE)
}
