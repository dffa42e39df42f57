pub mod error;
pub mod media;
pub mod messaging;
pub mod profile;
pub mod promotion;
pub mod registration;

pub use error::ServiceError;
pub use media::{MediaError, MediaKind, MediaStorage};
pub use messaging::{ConversationSummary, Messaging, SeedOutcome};
pub use profile::{Profile, ProfileResolver};
pub use promotion::PromotionWorkflow;
pub use registration::{register_student, StudentRegistration};
