// 📚 Course Entity - one scheduled index of a course
//
// "Course code is shared, index number is IDENTITY"
//
// Several indexes (sections) share one course code. Each index owns its own
// seats: a roster bounded by capacity and an unbounded FIFO waitlist. Both
// hold matriculation numbers, never Student copies; the UserRegistry owns the
// canonical Student records.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{EnrollmentError, Result};

// ============================================================================
// COURSE ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Course code shared by every index of the course, e.g. "CZ2002"
    pub code: String,

    /// Offering school, e.g. "SCSE"
    pub school: String,

    /// Unique key within the registry
    pub index_number: String,

    /// Number of roster seats
    pub capacity: u32,

    /// Academic units; identical across all indexes of a code
    pub credits: u32,

    /// Lesson descriptions, opaque to the engine
    pub lessons: Vec<String>,

    roster: Vec<String>,
    waitlist: VecDeque<String>,
}

impl Course {
    pub fn new(
        code: impl Into<String>,
        school: impl Into<String>,
        index_number: impl Into<String>,
        capacity: u32,
        credits: u32,
    ) -> Self {
        Course {
            code: code.into(),
            school: school.into(),
            index_number: index_number.into(),
            capacity,
            credits,
            lessons: Vec::new(),
            roster: Vec::new(),
            waitlist: VecDeque::new(),
        }
    }

    pub fn with_lessons(mut self, lessons: Vec<String>) -> Self {
        self.lessons = lessons;
        self
    }

    /// Registered students, in roster order
    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    /// Waitlisted students, oldest first
    pub fn waitlist(&self) -> impl ExactSizeIterator<Item = &String> {
        self.waitlist.iter()
    }

    pub fn waitlist_len(&self) -> usize {
        self.waitlist.len()
    }

    /// Free roster seats
    pub fn vacancies(&self) -> u32 {
        self.capacity.saturating_sub(self.roster.len() as u32)
    }

    pub fn has_vacancy(&self) -> bool {
        (self.roster.len() as u32) < self.capacity
    }

    pub fn is_registered(&self, student_id: &str) -> bool {
        self.roster.iter().any(|s| s == student_id)
    }

    pub fn is_waitlisted(&self, student_id: &str) -> bool {
        self.waitlist.iter().any(|s| s == student_id)
    }

    pub fn is_same_code(&self, other: &Course) -> bool {
        self.code == other.code
    }

    // ------------------------------------------------------------------------
    // Mutation is crate-private: only the engine and the storage loader touch
    // seats, and both keep the Student side in step.
    // ------------------------------------------------------------------------

    pub(crate) fn push_roster(&mut self, student_id: &str) {
        debug_assert!(self.has_vacancy());
        self.roster.push(student_id.to_string());
    }

    pub(crate) fn remove_from_roster(&mut self, student_id: &str) -> bool {
        match self.roster.iter().position(|s| s == student_id) {
            Some(pos) => {
                self.roster.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Replace one roster entry in place, keeping its position
    pub(crate) fn replace_in_roster(&mut self, old_id: &str, new_id: &str) -> bool {
        match self.roster.iter_mut().find(|s| s.as_str() == old_id) {
            Some(slot) => {
                *slot = new_id.to_string();
                true
            }
            None => false,
        }
    }

    pub(crate) fn push_waitlist(&mut self, student_id: &str) {
        self.waitlist.push_back(student_id.to_string());
    }

    pub(crate) fn remove_from_waitlist(&mut self, student_id: &str) -> bool {
        match self.waitlist.iter().position(|s| s == student_id) {
            Some(pos) => {
                self.waitlist.remove(pos);
                true
            }
            None => false,
        }
    }

    pub(crate) fn pop_waitlist(&mut self) -> Option<String> {
        self.waitlist.pop_front()
    }
}

// ============================================================================
// COURSE REGISTRY
// ============================================================================

/// Authoritative collection of every index, keyed by index number and
/// grouped by course code.
///
/// Membership is fixed once loaded; only seats change during a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseRegistry {
    courses: BTreeMap<String, Course>,
    by_code: BTreeMap<String, BTreeSet<String>>,
}

impl CourseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, rejecting it if two indexes of one code disagree on credits
    pub fn from_courses<I>(courses: I) -> Result<Self>
    where
        I: IntoIterator<Item = Course>,
    {
        let mut registry = CourseRegistry::new();
        for course in courses {
            registry.register(course)?;
        }
        Ok(registry)
    }

    /// Add one index
    pub fn register(&mut self, course: Course) -> Result<()> {
        if self.courses.contains_key(&course.index_number) {
            return Err(EnrollmentError::DuplicateIndex(course.index_number));
        }

        if let Some(existing) = self.indexes_for_code(&course.code).first() {
            if existing.credits != course.credits {
                return Err(EnrollmentError::InconsistentCreditValue {
                    code: course.code.clone(),
                    first: existing.credits,
                    second: course.credits,
                });
            }
        }

        self.by_code
            .entry(course.code.clone())
            .or_default()
            .insert(course.index_number.clone());
        self.courses.insert(course.index_number.clone(), course);
        Ok(())
    }

    pub fn lookup(&self, index_number: &str) -> Result<&Course> {
        self.courses
            .get(index_number)
            .ok_or_else(|| EnrollmentError::IndexNotFound(index_number.to_string()))
    }

    pub(crate) fn lookup_mut(&mut self, index_number: &str) -> Result<&mut Course> {
        self.courses
            .get_mut(index_number)
            .ok_or_else(|| EnrollmentError::IndexNotFound(index_number.to_string()))
    }

    /// True iff both indexes resolve and share a course code
    pub fn same_code(&self, index_a: &str, index_b: &str) -> bool {
        match (self.courses.get(index_a), self.courses.get(index_b)) {
            (Some(a), Some(b)) => a.is_same_code(b),
            _ => false,
        }
    }

    /// Every index of a course code, ordered by index number
    pub fn indexes_for_code(&self, code: &str) -> Vec<&Course> {
        self.by_code
            .get(code)
            .map(|indexes| {
                indexes
                    .iter()
                    .filter_map(|index| self.courses.get(index))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn vacancies(&self, index_number: &str) -> Result<u32> {
        self.lookup(index_number).map(Course::vacancies)
    }

    pub fn courses(&self) -> impl Iterator<Item = &Course> {
        self.courses.values()
    }

    pub fn count(&self) -> usize {
        self.courses.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================
