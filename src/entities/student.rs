// 🎓 Student / Admin accounts - closed set of roles
//
// "Matriculation number is IDENTITY, course lists are STATE"
//
// A Student's registered and waitlisted sets hold index numbers. They are
// resolved back through the CourseRegistry whenever course details (code,
// credits) are needed, so there is exactly one copy of each Course.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::course::{Course, CourseRegistry};
use crate::error::{EnrollmentError, Result};
use crate::password::PasswordHash;

// ============================================================================
// GENDER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
            Gender::Other => "O",
        }
    }

    /// Accepts the stored letter or the full word, any case
    pub fn parse(value: &str) -> Option<Gender> {
        match value.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Some(Gender::Male),
            "f" | "female" => Some(Gender::Female),
            "o" | "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

// ============================================================================
// STUDENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub name: String,

    /// Matriculation number; unique across all students
    pub matric_no: String,

    pub gender: Gender,
    pub nationality: String,
    pub username: String,
    pub email: String,

    registered: BTreeSet<String>,
    waitlisted: BTreeSet<String>,

    #[serde(skip)]
    password: Option<PasswordHash>,
}

impl Student {
    pub fn new(
        name: impl Into<String>,
        matric_no: impl Into<String>,
        gender: Gender,
        nationality: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Student {
            name: name.into(),
            matric_no: matric_no.into(),
            gender,
            nationality: nationality.into(),
            username: username.into(),
            email: email.into(),
            registered: BTreeSet::new(),
            waitlisted: BTreeSet::new(),
            password: None,
        }
    }

    pub fn with_password(mut self, password: PasswordHash) -> Self {
        self.password = Some(password);
        self
    }

    /// `None` for accounts that cannot log in yet
    pub fn password(&self) -> Option<&PasswordHash> {
        self.password.as_ref()
    }

    /// Index numbers holding a confirmed seat
    pub fn registered(&self) -> impl Iterator<Item = &str> {
        self.registered.iter().map(String::as_str)
    }

    /// Index numbers the student is queued for
    pub fn waitlisted(&self) -> impl Iterator<Item = &str> {
        self.waitlisted.iter().map(String::as_str)
    }

    pub fn is_registered(&self, index_number: &str) -> bool {
        self.registered.contains(index_number)
    }

    pub fn is_waitlisted(&self, index_number: &str) -> bool {
        self.waitlisted.contains(index_number)
    }

    /// The index of `code` this student already holds (registered or waitlisted), if any
    pub fn held_index_for_code<'a>(
        &'a self,
        code: &str,
        courses: &CourseRegistry,
    ) -> Option<&'a str> {
        self.registered
            .iter()
            .chain(self.waitlisted.iter())
            .find(|index| {
                courses
                    .lookup(index)
                    .map(|course| course.code == code)
                    .unwrap_or(false)
            })
            .map(String::as_str)
    }

    /// Sum of credits over registered courses
    pub fn credit_total(&self, courses: &CourseRegistry) -> u32 {
        Self::sum_credits(self.registered.iter(), courses)
    }

    /// Registered plus waitlisted credits; what the credit cap is checked against
    pub fn committed_credits(&self, courses: &CourseRegistry) -> u32 {
        Self::sum_credits(self.registered.iter().chain(self.waitlisted.iter()), courses)
    }

    fn sum_credits<'a>(
        indexes: impl Iterator<Item = &'a String>,
        courses: &CourseRegistry,
    ) -> u32 {
        indexes
            .filter_map(|index| courses.lookup(index).ok())
            .map(|course| course.credits)
            .sum()
    }

    /// Resolve registered index numbers to courses
    pub fn registered_courses<'a>(&self, courses: &'a CourseRegistry) -> Vec<&'a Course> {
        self.registered
            .iter()
            .filter_map(|index| courses.lookup(index).ok())
            .collect()
    }

    /// Resolve waitlisted index numbers to courses
    pub fn waitlisted_courses<'a>(&self, courses: &'a CourseRegistry) -> Vec<&'a Course> {
        self.waitlisted
            .iter()
            .filter_map(|index| courses.lookup(index).ok())
            .collect()
    }

    pub(crate) fn add_registered(&mut self, index_number: &str) {
        self.registered.insert(index_number.to_string());
    }

    pub(crate) fn remove_registered(&mut self, index_number: &str) -> bool {
        self.registered.remove(index_number)
    }

    pub(crate) fn add_waitlisted(&mut self, index_number: &str) {
        self.waitlisted.insert(index_number.to_string());
    }

    pub(crate) fn remove_waitlisted(&mut self, index_number: &str) -> bool {
        self.waitlisted.remove(index_number)
    }
}

// ============================================================================
// ADMIN
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    pub name: String,
    pub staff_id: String,
    pub gender: Gender,
    pub nationality: String,
    pub username: String,

    #[serde(skip)]
    password: Option<PasswordHash>,
}

impl Admin {
    pub fn new(
        name: impl Into<String>,
        staff_id: impl Into<String>,
        gender: Gender,
        nationality: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Admin {
            name: name.into(),
            staff_id: staff_id.into(),
            gender,
            nationality: nationality.into(),
            username: username.into(),
            password: None,
        }
    }

    pub fn with_password(mut self, password: PasswordHash) -> Self {
        self.password = Some(password);
        self
    }

    pub fn password(&self) -> Option<&PasswordHash> {
        self.password.as_ref()
    }
}

// ============================================================================
// USER ACCOUNT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserAccount {
    Student(Student),
    Admin(Admin),
}

impl UserAccount {
    pub fn username(&self) -> &str {
        match self {
            UserAccount::Student(student) => &student.username,
            UserAccount::Admin(admin) => &admin.username,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            UserAccount::Student(student) => &student.name,
            UserAccount::Admin(admin) => &admin.name,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            UserAccount::Student(_) => Role::Student,
            UserAccount::Admin(_) => Role::Admin,
        }
    }

    pub fn as_student(&self) -> Option<&Student> {
        match self {
            UserAccount::Student(student) => Some(student),
            UserAccount::Admin(_) => None,
        }
    }

    /// False for accounts with no stored password
    pub fn verify_password(&self, password: &str) -> bool {
        let stored = match self {
            UserAccount::Student(student) => student.password(),
            UserAccount::Admin(admin) => admin.password(),
        };
        stored.is_some_and(|hash| hash.verify(password))
    }
}

// ============================================================================
// USER REGISTRY
// ============================================================================

/// Owns every account, keyed by username, with a matriculation-number index
/// for the engine's student lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRegistry {
    accounts: BTreeMap<String, UserAccount>,
    matric_index: BTreeMap<String, String>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_accounts<I>(accounts: I) -> Result<Self>
    where
        I: IntoIterator<Item = UserAccount>,
    {
        let mut registry = UserRegistry::new();
        for account in accounts {
            registry.register(account)?;
        }
        Ok(registry)
    }

    /// Add an account; usernames and matriculation numbers must be unique
    pub fn register(&mut self, account: UserAccount) -> Result<()> {
        let username = account.username().to_string();
        if self.accounts.contains_key(&username) {
            return Err(EnrollmentError::DuplicateAccount(username));
        }

        if let UserAccount::Student(student) = &account {
            if self.matric_index.contains_key(&student.matric_no) {
                return Err(EnrollmentError::DuplicateAccount(student.matric_no.clone()));
            }
            self.matric_index
                .insert(student.matric_no.clone(), username.clone());
        }

        self.accounts.insert(username, account);
        Ok(())
    }

    /// Admin "add student": check the record's fields, then register it
    ///
    /// Usernames and matriculation numbers must still be unused.
    pub fn add_student(&mut self, student: Student) -> Result<()> {
        check_text("name", &student.name)?;
        check_text("matric no.", &student.matric_no)?;
        check_text("nationality", &student.nationality)?;
        check_text("username", &student.username)?;
        if !is_valid_email(&student.email) {
            return Err(EnrollmentError::InvalidField {
                field: "email",
                value: student.email.clone(),
            });
        }

        self.register(UserAccount::Student(student))
    }

    pub fn account(&self, username: &str) -> Option<&UserAccount> {
        self.accounts.get(username)
    }

    pub fn student(&self, matric_no: &str) -> Result<&Student> {
        self.matric_index
            .get(matric_no)
            .and_then(|username| self.accounts.get(username))
            .and_then(UserAccount::as_student)
            .ok_or_else(|| EnrollmentError::StudentNotFound(matric_no.to_string()))
    }

    pub(crate) fn student_mut(&mut self, matric_no: &str) -> Result<&mut Student> {
        let username = self
            .matric_index
            .get(matric_no)
            .ok_or_else(|| EnrollmentError::StudentNotFound(matric_no.to_string()))?;

        match self.accounts.get_mut(username) {
            Some(UserAccount::Student(student)) => Ok(student),
            _ => Err(EnrollmentError::StudentNotFound(matric_no.to_string())),
        }
    }

    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.accounts.values().filter_map(UserAccount::as_student)
    }

    pub fn admins(&self) -> impl Iterator<Item = &Admin> {
        self.accounts.values().filter_map(|account| match account {
            UserAccount::Admin(admin) => Some(admin),
            UserAccount::Student(_) => None,
        })
    }

    /// Students holding a seat on one index, in roster order
    pub fn students_on_index(
        &self,
        courses: &CourseRegistry,
        index_number: &str,
    ) -> Result<Vec<&Student>> {
        let course = courses.lookup(index_number)?;
        Ok(course
            .roster()
            .iter()
            .filter_map(|matric_no| self.student(matric_no).ok())
            .collect())
    }

    /// Students holding a seat on any index of a course code
    pub fn students_on_course_code(&self, courses: &CourseRegistry, code: &str) -> Vec<&Student> {
        courses
            .indexes_for_code(code)
            .into_iter()
            .flat_map(|course| course.roster().iter())
            .filter_map(|matric_no| self.student(matric_no).ok())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.accounts.len()
    }
}

/// Non-empty, no surrounding whitespace, no `|` or control characters
fn check_text(field: &'static str, value: &str) -> Result<()> {
    let valid = !value.is_empty()
        && value.trim() == value
        && !value.contains('|')
        && !value.chars().any(char::is_control);

    if valid {
        Ok(())
    } else {
        Err(EnrollmentError::InvalidField {
            field,
            value: value.to_string(),
        })
    }
}

/// `local@domain.tld` with no whitespace and no `|`
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
        && email.chars().all(|c| c.is_ascii_graphic() && c != '|')
}

// ============================================================================
// TESTS
// ============================================================================
