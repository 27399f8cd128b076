// ⚙️ Enrollment Engine - keeps rosters, waitlists and student course lists in step
//
// Every operation validates everything first and only then mutates, so an
// error leaves both registries exactly as they were. Whenever a roster seat
// opens (drop, index change) the course's waitlist is promoted greedily in
// FIFO order until the roster is full or the waitlist is empty.
//
// The engine holds no state of its own: the CourseRegistry and UserRegistry
// are borrowed mutably for the duration of one call.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EnrollmentConfig;
use crate::entities::{CourseRegistry, UserRegistry};
use crate::error::{EnrollmentError, Result};
use crate::notify::PromotionEvent;

/// Default per-student cap in academic units
pub const DEFAULT_MAX_CREDITS: u32 = 21;

// ============================================================================
// OUTCOMES
// ============================================================================

/// Where a student ended up (or was removed from) on an index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    Registered,
    Waitlisted,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Registered => "registered",
            Placement::Waitlisted => "waitlisted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropOutcome {
    /// What the student held before dropping
    pub dropped: Placement,
    pub promotions: Vec<PromotionEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOutcome {
    pub from_index: String,
    pub to_index: String,
    /// Students promoted into the seat freed on `from_index`
    pub promotions: Vec<PromotionEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    pub student_a: String,
    pub student_b: String,
    /// Index `student_a` now holds
    pub index_a: String,
    /// Index `student_b` now holds
    pub index_b: String,
}

// ============================================================================
// ENROLLMENT ENGINE
// ============================================================================

#[derive(Debug, Clone)]
pub struct EnrollmentEngine {
    /// Per-student academic unit cap; `None` disables the check
    pub max_credits: Option<u32>,
}

impl EnrollmentEngine {
    pub fn new() -> Self {
        EnrollmentEngine {
            max_credits: Some(DEFAULT_MAX_CREDITS),
        }
    }

    pub fn with_credit_limit(max_credits: Option<u32>) -> Self {
        EnrollmentEngine { max_credits }
    }

    pub fn from_config(config: &EnrollmentConfig) -> Self {
        Self::with_credit_limit(config.max_credits)
    }

    /// Register a student on an index, or queue them if the roster is full
    ///
    /// Fails with `DuplicateCourseCode` if the student already holds any index
    /// of the same course (including this one), and with `CreditLimitExceeded`
    /// if the new course would take the student's registered plus waitlisted
    /// units past the cap.
    pub fn add_course(
        &self,
        courses: &mut CourseRegistry,
        users: &mut UserRegistry,
        student_id: &str,
        index_number: &str,
    ) -> Result<Placement> {
        let course = courses.lookup(index_number)?;
        let student = users.student(student_id)?;

        if let Some(held) = student.held_index_for_code(&course.code, courses) {
            return Err(EnrollmentError::DuplicateCourseCode {
                student: student_id.to_string(),
                code: course.code.clone(),
                held: held.to_string(),
            });
        }

        if let Some(limit) = self.max_credits {
            let total = student.committed_credits(courses) + course.credits;
            if total > limit {
                return Err(EnrollmentError::CreditLimitExceeded {
                    student: student_id.to_string(),
                    credits: course.credits,
                    total,
                    limit,
                });
            }
        }

        let placement = if course.has_vacancy() {
            Placement::Registered
        } else {
            Placement::Waitlisted
        };

        // Commit
        let course = courses.lookup_mut(index_number)?;
        let student = users.student_mut(student_id)?;
        match placement {
            Placement::Registered => {
                course.push_roster(student_id);
                student.add_registered(index_number);
            }
            Placement::Waitlisted => {
                course.push_waitlist(student_id);
                student.add_waitlisted(index_number);
            }
        }

        info!(
            student = student_id,
            index = index_number,
            code = %course.code,
            "course added ({})",
            placement.as_str()
        );
        Ok(placement)
    }

    /// Remove a student from an index's roster or waitlist
    ///
    /// Leaving the roster frees a seat, which is immediately offered to the
    /// head of the waitlist.
    pub fn drop_course(
        &self,
        courses: &mut CourseRegistry,
        users: &mut UserRegistry,
        student_id: &str,
        index_number: &str,
    ) -> Result<DropOutcome> {
        let course = courses.lookup(index_number)?;
        users.student(student_id)?;

        let dropped = if course.is_registered(student_id) {
            Placement::Registered
        } else if course.is_waitlisted(student_id) {
            Placement::Waitlisted
        } else {
            return Err(EnrollmentError::NotRegistered {
                student: student_id.to_string(),
                index: index_number.to_string(),
            });
        };

        // Commit
        let course = courses.lookup_mut(index_number)?;
        let student = users.student_mut(student_id)?;
        match dropped {
            Placement::Registered => {
                course.remove_from_roster(student_id);
                student.remove_registered(index_number);
            }
            Placement::Waitlisted => {
                course.remove_from_waitlist(student_id);
                student.remove_waitlisted(index_number);
            }
        }

        info!(
            student = student_id,
            index = index_number,
            "course dropped ({})",
            dropped.as_str()
        );

        let promotions = match dropped {
            Placement::Registered => self.promote(courses, users, index_number)?,
            Placement::Waitlisted => Vec::new(),
        };

        Ok(DropOutcome {
            dropped,
            promotions,
        })
    }

    /// Move a registered student to another index of the same course
    ///
    /// Validation order (first failure wins): SameIndex, IndexNotFound,
    /// CourseCodeMismatch, NoVacancy, NotRegistered.
    pub fn change_index(
        &self,
        courses: &mut CourseRegistry,
        users: &mut UserRegistry,
        student_id: &str,
        from_index: &str,
        to_index: &str,
    ) -> Result<ChangeOutcome> {
        if from_index == to_index {
            return Err(EnrollmentError::SameIndex(from_index.to_string()));
        }

        let from = courses.lookup(from_index)?;
        let to = courses.lookup(to_index)?;

        if !from.is_same_code(to) {
            return Err(EnrollmentError::CourseCodeMismatch {
                from: from_index.to_string(),
                from_code: from.code.clone(),
                to: to_index.to_string(),
                to_code: to.code.clone(),
            });
        }

        if !to.has_vacancy() {
            return Err(EnrollmentError::NoVacancy(to_index.to_string()));
        }

        let student = users.student(student_id)?;
        if !from.is_registered(student_id) || !student.is_registered(from_index) {
            return Err(EnrollmentError::NotRegistered {
                student: student_id.to_string(),
                index: from_index.to_string(),
            });
        }

        // Commit
        courses.lookup_mut(from_index)?.remove_from_roster(student_id);
        courses.lookup_mut(to_index)?.push_roster(student_id);
        let student = users.student_mut(student_id)?;
        student.remove_registered(from_index);
        student.add_registered(to_index);

        info!(
            student = student_id,
            from = from_index,
            to = to_index,
            "index changed"
        );

        let promotions = self.promote(courses, users, from_index)?;

        Ok(ChangeOutcome {
            from_index: from_index.to_string(),
            to_index: to_index.to_string(),
            promotions,
        })
    }

    /// Exchange the indexes of two students registered on different indexes
    /// of the same course
    ///
    /// Both rosters keep their sizes and each student takes the other's roster
    /// position, so no promotion is needed.
    pub fn swap_index(
        &self,
        courses: &mut CourseRegistry,
        users: &mut UserRegistry,
        student_a: &str,
        index_a: &str,
        student_b: &str,
        index_b: &str,
    ) -> Result<SwapOutcome> {
        if student_a == student_b {
            return Err(EnrollmentError::SameStudent(student_a.to_string()));
        }
        if index_a == index_b {
            return Err(EnrollmentError::SameIndex(index_a.to_string()));
        }

        let course_a = courses.lookup(index_a)?;
        let course_b = courses.lookup(index_b)?;

        if !course_a.is_same_code(course_b) {
            return Err(EnrollmentError::CourseCodeMismatch {
                from: index_a.to_string(),
                from_code: course_a.code.clone(),
                to: index_b.to_string(),
                to_code: course_b.code.clone(),
            });
        }

        for (student_id, index, course) in [
            (student_a, index_a, course_a),
            (student_b, index_b, course_b),
        ] {
            let student = users.student(student_id)?;
            if !course.is_registered(student_id) || !student.is_registered(index) {
                return Err(EnrollmentError::NotRegistered {
                    student: student_id.to_string(),
                    index: index.to_string(),
                });
            }
        }

        // Commit
        courses
            .lookup_mut(index_a)?
            .replace_in_roster(student_a, student_b);
        courses
            .lookup_mut(index_b)?
            .replace_in_roster(student_b, student_a);

        let a = users.student_mut(student_a)?;
        a.remove_registered(index_a);
        a.add_registered(index_b);

        let b = users.student_mut(student_b)?;
        b.remove_registered(index_b);
        b.add_registered(index_a);

        info!(
            student_a = student_a,
            student_b = student_b,
            index_a = index_a,
            index_b = index_b,
            "indexes swapped"
        );

        Ok(SwapOutcome {
            student_a: student_a.to_string(),
            student_b: student_b.to_string(),
            index_a: index_b.to_string(),
            index_b: index_a.to_string(),
        })
    }

    /// Fill free roster seats from the head of the waitlist
    fn promote(
        &self,
        courses: &mut CourseRegistry,
        users: &mut UserRegistry,
        index_number: &str,
    ) -> Result<Vec<PromotionEvent>> {
        let course = courses.lookup_mut(index_number)?;
        let mut promotions = Vec::new();

        while course.has_vacancy() {
            let Some(next) = course.pop_waitlist() else {
                break;
            };

            let student = match users.student_mut(&next) {
                Ok(student) => student,
                Err(_) => {
                    warn!(
                        student = %next,
                        index = index_number,
                        "discarding waitlist entry for unknown student"
                    );
                    continue;
                }
            };

            course.push_roster(&next);
            student.remove_waitlisted(index_number);
            student.add_registered(index_number);

            info!(student = %next, index = index_number, "promoted from waitlist");
            promotions.push(PromotionEvent::new(&next, index_number, &course.code));
        }

        Ok(promotions)
    }
}

impl Default for EnrollmentEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
