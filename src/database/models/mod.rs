pub mod announcement;
pub mod assignment;
pub mod enrolled_course;
pub mod message;
pub mod quiz_task;
pub mod student;
pub mod teacher;
pub mod teacher_request;
pub mod user;
pub mod video;

pub use announcement::{Announcement, Audience};
pub use assignment::{Assignment, AssignmentSubmission};
pub use enrolled_course::EnrolledCourse;
pub use message::Message;
pub use quiz_task::QuizTask;
pub use student::{PersonalDetails, Student};
pub use teacher::{Course, Teacher};
pub use teacher_request::{RequestStatus, TeacherRequest};
pub use user::{Role, User};
pub use video::Video;
