// Course Enrollment System - Core Library
// Exposes the enrollment engine, its registries and the collaborators around it

pub mod entities;
pub mod error;
pub mod engine;
pub mod notify;
pub mod config;
pub mod session;
pub mod password;
pub mod storage;
pub mod db;

// Re-export commonly used types
pub use entities::{
    Admin, Course, CourseRegistry, Gender, Role, Student, UserAccount, UserRegistry,
};
pub use error::EnrollmentError;
pub use engine::{
    ChangeOutcome, DropOutcome, EnrollmentEngine, Placement, SwapOutcome, DEFAULT_MAX_CREDITS,
};
pub use notify::{dispatch, LogNotifier, Notifier, PromotionEvent, RecordingNotifier};
pub use config::EnrollmentConfig;
pub use session::{AccessPeriod, Session};
pub use password::PasswordHash;
pub use storage::{LoadedState, Storage};
pub use db::{AuditLog, EnrollmentEvent, EventFilter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
