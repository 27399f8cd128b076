//! Property-based tests for the enrollment engine
//!
//! Random sequences of add / drop / change / swap are applied to a small
//! campus. After every step, successful or not, these must hold:
//! - no roster exceeds its capacity
//! - a non-empty waitlist implies a full roster
//! - a student sits on at most one index per course code, and never on both
//!   the roster and the waitlist of the same index
//! - each student's course lists mirror the rosters and waitlists exactly
//! - committed credits never exceed the cap
//! - a failed operation leaves both registries unchanged

use proptest::prelude::*;

use course_enrollment::{
    Course, CourseRegistry, EnrollmentEngine, Gender, Student, UserAccount, UserRegistry,
};

const STUDENTS: [&str; 5] = ["S1", "S2", "S3", "S4", "S5"];
const INDEXES: [&str; 5] = ["A1", "A2", "A3", "B1", "C1"];
const CREDIT_CAP: u32 = 7;

fn campus() -> (CourseRegistry, UserRegistry) {
    let courses = CourseRegistry::from_courses(vec![
        Course::new("CS101", "SCSE", "A1", 1, 3),
        Course::new("CS101", "SCSE", "A2", 2, 3),
        Course::new("CS101", "SCSE", "A3", 1, 3),
        Course::new("MA101", "SPMS", "B1", 2, 4),
        Course::new("PH101", "SPMS", "C1", 1, 2),
    ])
    .unwrap();

    let users = UserRegistry::from_accounts(STUDENTS.iter().map(|matric| {
        UserAccount::Student(Student::new(
            format!("Student {}", matric),
            *matric,
            Gender::Other,
            "Singaporean",
            matric.to_lowercase(),
            format!("{}@e.ntu.edu.sg", matric.to_lowercase()),
        ))
    }))
    .unwrap();

    (courses, users)
}

#[derive(Debug, Clone)]
enum Op {
    Add { student: usize, index: usize },
    Drop { student: usize, index: usize },
    Change { student: usize, from: usize, to: usize },
    Swap { a: usize, index_a: usize, b: usize, index_b: usize },
}

/// Strategy for generating a single engine operation
fn op_strategy() -> impl Strategy<Value = Op> {
    let student = 0..STUDENTS.len();
    let index = 0..INDEXES.len();

    prop_oneof![
        4 => (student.clone(), index.clone())
            .prop_map(|(student, index)| Op::Add { student, index }),
        2 => (student.clone(), index.clone())
            .prop_map(|(student, index)| Op::Drop { student, index }),
        2 => (student.clone(), index.clone(), index.clone())
            .prop_map(|(student, from, to)| Op::Change { student, from, to }),
        1 => (student.clone(), index.clone(), student, index)
            .prop_map(|(a, index_a, b, index_b)| Op::Swap { a, index_a, b, index_b }),
    ]
}

/// Apply one operation; true if the engine accepted it
fn apply(
    engine: &EnrollmentEngine,
    courses: &mut CourseRegistry,
    users: &mut UserRegistry,
    op: &Op,
) -> bool {
    match *op {
        Op::Add { student, index } => engine
            .add_course(courses, users, STUDENTS[student], INDEXES[index])
            .is_ok(),
        Op::Drop { student, index } => engine
            .drop_course(courses, users, STUDENTS[student], INDEXES[index])
            .is_ok(),
        Op::Change { student, from, to } => engine
            .change_index(courses, users, STUDENTS[student], INDEXES[from], INDEXES[to])
            .is_ok(),
        Op::Swap { a, index_a, b, index_b } => engine
            .swap_index(
                courses,
                users,
                STUDENTS[a],
                INDEXES[index_a],
                STUDENTS[b],
                INDEXES[index_b],
            )
            .is_ok(),
    }
}

fn check_invariants(courses: &CourseRegistry, users: &UserRegistry) -> Result<(), TestCaseError> {
    for course in courses.courses() {
        let roster = course.roster();
        prop_assert!(roster.len() as u32 <= course.capacity);
        if course.waitlist_len() > 0 {
            prop_assert_eq!(roster.len() as u32, course.capacity);
        }
        for id in course.waitlist() {
            prop_assert!(!roster.contains(id), "{} on both lists of {}", id, course.index_number);
        }
    }

    for student in users.students() {
        let id = student.matric_no.as_str();

        let mut held_codes: Vec<&str> = Vec::new();
        for course in courses.courses() {
            prop_assert_eq!(course.is_registered(id), student.is_registered(&course.index_number));
            prop_assert_eq!(course.is_waitlisted(id), student.is_waitlisted(&course.index_number));
            if course.is_registered(id) || course.is_waitlisted(id) {
                held_codes.push(course.code.as_str());
            }
        }

        let total = held_codes.len();
        held_codes.sort_unstable();
        held_codes.dedup();
        prop_assert_eq!(held_codes.len(), total, "{} holds two indexes of one code", id);

        prop_assert!(student.committed_credits(courses) <= CREDIT_CAP);
        let registered: u32 = student
            .registered_courses(courses)
            .iter()
            .map(|course| course.credits)
            .sum();
        prop_assert_eq!(student.credit_total(courses), registered);
    }

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Every reachable state satisfies the enrollment invariants
    #[test]
    fn invariants_hold_after_any_sequence(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let engine = EnrollmentEngine::with_credit_limit(Some(CREDIT_CAP));
        let (mut courses, mut users) = campus();

        for op in &ops {
            apply(&engine, &mut courses, &mut users, op);
            check_invariants(&courses, &users)?;
        }
    }

    /// A rejected operation mutates nothing
    #[test]
    fn failed_operations_are_atomic(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let engine = EnrollmentEngine::with_credit_limit(Some(CREDIT_CAP));
        let (mut courses, mut users) = campus();

        for op in &ops {
            let before = (courses.clone(), users.clone());
            if !apply(&engine, &mut courses, &mut users, op) {
                prop_assert_eq!(&courses, &before.0, "courses changed by failed {:?}", op);
                prop_assert_eq!(&users, &before.1, "users changed by failed {:?}", op);
            }
        }
    }

    /// Seats taken never exceed what the campus offers, and nobody is lost
    #[test]
    fn seat_accounting_is_conserved(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let engine = EnrollmentEngine::with_credit_limit(Some(CREDIT_CAP));
        let (mut courses, mut users) = campus();

        for op in &ops {
            apply(&engine, &mut courses, &mut users, op);

            let seats: usize = courses.courses().map(|c| c.roster().len()).sum();
            let held: usize = users.students().map(|s| s.registered().count()).sum();
            prop_assert_eq!(seats, held);

            let queued: usize = courses.courses().map(|c| c.waitlist_len()).sum();
            let waiting: usize = users.students().map(|s| s.waitlisted().count()).sum();
            prop_assert_eq!(queued, waiting);
        }
    }
}
