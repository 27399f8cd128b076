// Entity Models
//
// Each entity has:
// - Stable identity (index number / matriculation number / username)
// - Mutable seat state, changed only by the enrollment engine
// - Registry that owns the canonical records; everything else refers by id

pub mod course;
pub mod student;

pub use course::{Course, CourseRegistry};
pub use student::{Admin, Gender, Role, Student, UserAccount, UserRegistry};
