use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;
pub mod types;

use crate::config::AppConfig;
use crate::services::media::PUBLIC_PREFIX;
pub use crate::state::AppState;

/// Full route table using the process-wide configuration
pub fn app(state: AppState) -> Router {
    app_with_config(state, config::config())
}

pub fn app_with_config(state: AppState, config: &AppConfig) -> Router {
    let uploads = ServeDir::new(state.media.root());

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        .merge(user_routes())
        .merge(message_routes())
        .merge(student_routes())
        .merge(teacher_routes())
        .merge(admin_routes())
        .nest_service(PUBLIC_PREFIX, uploads)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.security.cors_origins))
                .layer(DefaultBodyLimit::max(config.media.max_upload_bytes)),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new()
        .route("/users/email/:email", get(users::get_by_email))
        .route("/users/role", get(users::get_role))
        .route("/users/last-login/:email", put(users::touch_last_login))
        .route("/profile/:email", get(users::get_profile))
        .route("/admin/users", get(users::list))
}

fn message_routes() -> Router<AppState> {
    use handlers::messages;

    Router::new()
        .route("/messages", post(messages::send))
        .route("/messages/:user1/:user2", get(messages::thread))
        .route("/conversations/:user_email", get(messages::conversations))
        .route("/addTeacher", post(messages::add_contact))
        .route("/addStudent", post(messages::add_contact))
}

fn student_routes() -> Router<AppState> {
    use handlers::{admin, student, teacher};

    Router::new()
        .route("/students/register", post(student::register))
        .route("/students/email/:email", get(student::get_by_email))
        .route("/student/announcements", get(student::announcements))
        .route("/student/assignments/:email", get(student::submissions))
        .route("/videos/:language", get(student::videos_by_language))
        .route("/videos/:language/:category", get(student::videos_by_category))
        .route("/quizzes-tasks", get(student::quizzes_tasks))
        .route("/assignments", get(student::assignments).post(teacher::create_assignment))
        .route("/assignments/submit", post(student::submit))
        .route("/my-courses/:email", get(student::my_courses))
        .route("/teacher-requests", post(student::create_teacher_request))
        .route("/teacher-requests/email/:email", get(student::teacher_requests_by_email))
        .route("/teacher-requests/approve/:id", put(admin::approve_teacher_request))
        .route("/teacher-requests/:id", put(admin::set_teacher_request_status))
}

fn teacher_routes() -> Router<AppState> {
    use handlers::teacher;

    Router::new()
        .route("/teachers/email/:email", get(teacher::get_by_email))
        .route("/teacher/announcements", get(teacher::announcements))
        .route("/teacher/submissions/:email", get(teacher::submissions))
        .route("/teacher/videos", post(teacher::upload_video))
        // GET takes the teacher's email, PUT/DELETE a video id
        .route(
            "/teacher/videos/:key",
            get(teacher::videos)
                .put(teacher::update_video)
                .delete(teacher::delete_video),
        )
        .route("/assignments/teacher/:email", get(teacher::assignments))
        .route("/assignments/:id", put(teacher::update_assignment))
        .route("/teacher/assignments/:id", axum::routing::delete(teacher::delete_assignment))
}

fn admin_routes() -> Router<AppState> {
    use handlers::admin;

    Router::new()
        .route("/admin/students", get(admin::list_students))
        .route(
            "/admin/students/:id",
            get(admin::get_student)
                .put(admin::update_student)
                .delete(admin::delete_student),
        )
        .route("/admin/teachers", get(admin::list_teachers))
        .route(
            "/admin/teachers/:id",
            get(admin::get_teacher)
                .put(admin::update_teacher)
                .delete(admin::delete_teacher),
        )
        .route("/admin/teachers/:id/courses", post(admin::add_course))
        .route(
            "/admin/announcements",
            get(admin::list_announcements).post(admin::create_announcement),
        )
        .route("/admin/announcements/:id", axum::routing::delete(admin::delete_announcement))
        .route(
            "/admin/quizzes-tasks",
            get(admin::list_quizzes_tasks).post(admin::create_quiz_task),
        )
        .route(
            "/admin/quizzes-tasks/:id",
            put(admin::update_quiz_task).delete(admin::delete_quiz_task),
        )
        .route("/admin/submissions", get(admin::list_submissions))
        .route(
            "/admin/submissions/:id",
            put(admin::grade_submission).delete(admin::delete_submission),
        )
        .route("/admin/teacher-requests", get(admin::list_teacher_requests))
        .route(
            "/admin/teacher-requests/:id",
            axum::routing::delete(admin::delete_teacher_request),
        )
}
