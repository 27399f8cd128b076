// ⚠️ Enrollment errors
//
// Every engine operation either applies completely or returns one of these
// with nothing mutated. None of them is fatal to the process: the caller shows
// the message and the requested operation is simply not applied.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentError {
    #[error("index number {0} does not exist")]
    IndexNotFound(String),

    #[error("student {0} does not exist")]
    StudentNotFound(String),

    #[error("index number {0} is defined more than once")]
    DuplicateIndex(String),

    #[error("account {0} is defined more than once")]
    DuplicateAccount(String),

    #[error("index {from} ({from_code}) and index {to} ({to_code}) belong to different courses")]
    CourseCodeMismatch {
        from: String,
        from_code: String,
        to: String,
        to_code: String,
    },

    #[error("index {0} has no vacancy")]
    NoVacancy(String),

    #[error("current and desired index are both {0}")]
    SameIndex(String),

    #[error("student {0} cannot swap an index with themselves")]
    SameStudent(String),

    #[error("student {student} is not registered for index {index}")]
    NotRegistered { student: String, index: String },

    #[error("student {student} already holds index {held} of course {code}")]
    DuplicateCourseCode {
        student: String,
        code: String,
        held: String,
    },

    #[error("course {code} has indexes with different credit values ({first} and {second} AUs)")]
    InconsistentCreditValue { code: String, first: u32, second: u32 },

    #[error("adding {credits} AUs would bring student {student} to {total} AUs (limit {limit})")]
    CreditLimitExceeded {
        student: String,
        credits: u32,
        total: u32,
        limit: u32,
    },

    #[error("student access is closed outside the access period")]
    AccessClosed,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("invalid {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("account {username} cannot do this as {role}")]
    WrongRole { username: String, role: &'static str },

    #[error("index {index} lists {listed} registered students but only has {capacity} seats")]
    RosterOverCapacity {
        index: String,
        listed: usize,
        capacity: u32,
    },

    #[error("student {student} is listed more than once for course {code} (index {index})")]
    ConflictingMembership {
        student: String,
        code: String,
        index: String,
    },
}

impl EnrollmentError {
    /// Stable short name for log lines and audit records
    pub fn kind(&self) -> &'static str {
        match self {
            EnrollmentError::IndexNotFound(_) => "index_not_found",
            EnrollmentError::StudentNotFound(_) => "student_not_found",
            EnrollmentError::DuplicateIndex(_) => "duplicate_index",
            EnrollmentError::DuplicateAccount(_) => "duplicate_account",
            EnrollmentError::CourseCodeMismatch { .. } => "course_code_mismatch",
            EnrollmentError::NoVacancy(_) => "no_vacancy",
            EnrollmentError::SameIndex(_) => "same_index",
            EnrollmentError::SameStudent(_) => "same_student",
            EnrollmentError::NotRegistered { .. } => "not_registered",
            EnrollmentError::DuplicateCourseCode { .. } => "duplicate_course_code",
            EnrollmentError::InconsistentCreditValue { .. } => "inconsistent_credit_value",
            EnrollmentError::CreditLimitExceeded { .. } => "credit_limit_exceeded",
            EnrollmentError::AccessClosed => "access_closed",
            EnrollmentError::InvalidCredentials => "invalid_credentials",
            EnrollmentError::InvalidField { .. } => "invalid_field",
            EnrollmentError::WrongRole { .. } => "wrong_role",
            EnrollmentError::RosterOverCapacity { .. } => "roster_over_capacity",
            EnrollmentError::ConflictingMembership { .. } => "conflicting_membership",
        }
    }
}

pub type Result<T> = std::result::Result<T, EnrollmentError>;
