// 💾 Text-file store - pipe-delimited records, one leading format line per file
//
// Layout of the data directory:
//   courses.txt     code|school|index|capacity|credits|lesson1*lesson2*...
//   registered.txt  index|matric1|matric2|...   (roster order)
//   waitlist.txt    index|matric1|matric2|...   (FIFO order, kept exactly)
//   students.txt    name|matric|gender|nationality|username|email|password hash
//   admins.txt      name|staff id|gender|nationality|username|password hash
//   settings.txt    start|end
//
// Loading rebuilds both registries and validates them; it never promotes,
// writes or notifies. Saving rewrites whole files through a temp file + rename,
// so each file is either the old or the new version. Values that would not
// read back unchanged (a `|`, a control character, surrounding spaces, or a
// `*` inside a lesson) are refused before anything is written. A failed save
// is reported to the caller and the in-memory state is left as it is.

use anyhow::{bail, Context, Result};
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Trim, WriterBuilder};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::EnrollmentConfig;
use crate::entities::{Admin, Course, CourseRegistry, Gender, Student, UserAccount, UserRegistry};
use crate::error::EnrollmentError;
use crate::password::PasswordHash;
use crate::session::{parse_timestamp, AccessPeriod};

pub const COURSES_FILE: &str = "courses.txt";
pub const REGISTERED_FILE: &str = "registered.txt";
pub const WAITLIST_FILE: &str = "waitlist.txt";
pub const STUDENTS_FILE: &str = "students.txt";
pub const ADMINS_FILE: &str = "admins.txt";
pub const SETTINGS_FILE: &str = "settings.txt";

const COURSES_FORMAT: &str =
    "format: course code|school|index number|vacancy|number of AUs|Lesson1*Lesson2*...";
const ROSTER_FORMAT: &str = "format: index number|student1 matric no.|student2...";
const STUDENTS_FORMAT: &str =
    "format: name|matric no.|gender|nationality|username|email|password hash";
const ADMINS_FORMAT: &str = "format: name|staff id|gender|nationality|username|password hash";
const SETTINGS_FORMAT: &str = "format: start datetime|end datetime";

const LESSON_SEPARATOR: &str = "*";

/// Everything a session needs, as loaded from disk
#[derive(Debug, Clone)]
pub struct LoadedState {
    pub courses: CourseRegistry,
    pub users: UserRegistry,
    pub access_period: Option<AccessPeriod>,
}

pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Storage { dir: dir.into() }
    }

    pub fn from_config(config: &EnrollmentConfig) -> Self {
        Self::new(config.data_dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ========================================================================
    // LOADING
    // ========================================================================

    /// Load courses, accounts, rosters, waitlists and the access period
    pub fn load(&self) -> Result<LoadedState> {
        let mut courses = self.load_courses()?;
        let mut users = self.load_users()?;
        self.load_rosters(&mut courses, &mut users)?;
        self.load_waitlists(&mut courses, &mut users)?;
        let access_period = self.load_access_period()?;

        info!(
            courses = courses.count(),
            accounts = users.count(),
            dir = %self.dir.display(),
            "enrollment data loaded"
        );

        Ok(LoadedState {
            courses,
            users,
            access_period,
        })
    }

    pub fn load_courses(&self) -> Result<CourseRegistry> {
        let records = self
            .read_records(COURSES_FILE)?
            .with_context(|| format!("{} not found in {}", COURSES_FILE, self.dir.display()))?;

        let mut courses = CourseRegistry::new();
        for (line, record) in records.iter().enumerate() {
            let course = parse_course(record)
                .with_context(|| format!("{} line {}", COURSES_FILE, line + 2))?;
            courses.register(course)?;
        }

        Ok(courses)
    }

    pub fn load_users(&self) -> Result<UserRegistry> {
        let mut users = UserRegistry::new();

        for (line, record) in self.read_optional(STUDENTS_FILE)?.iter().enumerate() {
            let student = parse_student(record)
                .with_context(|| format!("{} line {}", STUDENTS_FILE, line + 2))?;
            users.register(UserAccount::Student(student))?;
        }

        for (line, record) in self.read_optional(ADMINS_FILE)?.iter().enumerate() {
            let admin = parse_admin(record)
                .with_context(|| format!("{} line {}", ADMINS_FILE, line + 2))?;
            users.register(UserAccount::Admin(admin))?;
        }

        Ok(users)
    }

    /// Seat registered students; a roster larger than its index's capacity is rejected
    pub fn load_rosters(&self, courses: &mut CourseRegistry, users: &mut UserRegistry) -> Result<()> {
        for record in self.read_optional(REGISTERED_FILE)? {
            let (index, students) = parse_roster(&record)?;

            let course = courses.lookup(index)?;
            let listed = course.roster().len() + students.len();
            if listed > course.capacity as usize {
                return Err(EnrollmentError::RosterOverCapacity {
                    index: index.to_string(),
                    listed,
                    capacity: course.capacity,
                }
                .into());
            }

            for matric_no in students {
                check_membership(courses, users, matric_no, index)?;
                courses.lookup_mut(index)?.push_roster(matric_no);
                users.student_mut(matric_no)?.add_registered(index);
            }
        }

        Ok(())
    }

    /// Queue waitlisted students in file order
    ///
    /// No promotion happens here even when seats are free; the next live drop
    /// or index change on that course fills them.
    pub fn load_waitlists(
        &self,
        courses: &mut CourseRegistry,
        users: &mut UserRegistry,
    ) -> Result<()> {
        for record in self.read_optional(WAITLIST_FILE)? {
            let (index, students) = parse_roster(&record)?;
            courses.lookup(index)?;

            for matric_no in students {
                check_membership(courses, users, matric_no, index)?;
                courses.lookup_mut(index)?.push_waitlist(matric_no);
                users.student_mut(matric_no)?.add_waitlisted(index);
            }
        }

        for course in courses.courses() {
            if course.has_vacancy() && course.waitlist_len() > 0 {
                warn!(
                    index = %course.index_number,
                    vacancies = course.vacancies(),
                    waiting = course.waitlist_len(),
                    "waitlist loaded while seats are free; left for the next drop"
                );
            }
        }

        Ok(())
    }

    /// `None` when no access period has been configured yet
    pub fn load_access_period(&self) -> Result<Option<AccessPeriod>> {
        let Some(records) = self.read_records(SETTINGS_FILE)? else {
            return Ok(None);
        };

        match records.first() {
            Some(record) => {
                let start = field(record, 0, "start")?;
                let end = field(record, 1, "end")?;
                let start = parse_timestamp(start)?;
                let end = parse_timestamp(end)?;
                Ok(Some(AccessPeriod::new(start, end)?))
            }
            None => Ok(None),
        }
    }

    // ========================================================================
    // SAVING
    // ========================================================================

    /// Rewrite courses.txt, registered.txt and waitlist.txt
    pub fn save_courses(&self, courses: &CourseRegistry) -> Result<()> {
        for course in courses.courses() {
            for lesson in &course.lessons {
                check_lesson(&course.index_number, lesson)?;
            }
        }

        let course_rows = courses.courses().map(|course| {
            vec![
                course.code.clone(),
                course.school.clone(),
                course.index_number.clone(),
                course.capacity.to_string(),
                course.credits.to_string(),
                course.lessons.join(LESSON_SEPARATOR),
            ]
        });
        self.write_records(COURSES_FILE, COURSES_FORMAT, course_rows)?;

        let roster_rows = courses
            .courses()
            .filter(|course| !course.roster().is_empty())
            .map(|course| {
                std::iter::once(course.index_number.clone())
                    .chain(course.roster().iter().cloned())
                    .collect::<Vec<_>>()
            });
        self.write_records(REGISTERED_FILE, ROSTER_FORMAT, roster_rows)?;

        let waitlist_rows = courses
            .courses()
            .filter(|course| course.waitlist_len() > 0)
            .map(|course| {
                std::iter::once(course.index_number.clone())
                    .chain(course.waitlist().cloned())
                    .collect::<Vec<_>>()
            });
        self.write_records(WAITLIST_FILE, ROSTER_FORMAT, waitlist_rows)?;

        debug!(courses = courses.count(), "courses saved");
        Ok(())
    }

    pub fn save_access_period(&self, period: &AccessPeriod) -> Result<()> {
        let row = vec![
            period.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
            period.end.format("%Y-%m-%dT%H:%M:%S").to_string(),
        ];
        self.write_records(SETTINGS_FILE, SETTINGS_FORMAT, std::iter::once(row))
    }

    /// Rewrite students.txt and admins.txt
    pub fn save_users(&self, users: &UserRegistry) -> Result<()> {
        let student_rows = users.students().map(|s| {
            vec![
                s.name.clone(),
                s.matric_no.clone(),
                s.gender.as_str().to_string(),
                s.nationality.clone(),
                s.username.clone(),
                s.email.clone(),
                stored_password(s.password()),
            ]
        });
        self.write_records(STUDENTS_FILE, STUDENTS_FORMAT, student_rows)?;

        let admin_rows = users.admins().map(|a| {
            vec![
                a.name.clone(),
                a.staff_id.clone(),
                a.gender.as_str().to_string(),
                a.nationality.clone(),
                a.username.clone(),
                stored_password(a.password()),
            ]
        });
        self.write_records(ADMINS_FILE, ADMINS_FORMAT, admin_rows)
    }

    // ========================================================================
    // FILE HELPERS
    // ========================================================================

    /// Records after the format line; `None` if the file does not exist
    fn read_records(&self, file: &str) -> Result<Option<Vec<StringRecord>>> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(None);
        }

        let mut rdr = ReaderBuilder::new()
            .delimiter(b'|')
            .has_headers(true)
            .flexible(true)
            .quoting(false)
            .trim(Trim::All)
            .from_path(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let mut records = Vec::new();
        for result in rdr.records() {
            let record = result.with_context(|| format!("Failed to read {}", path.display()))?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            records.push(record);
        }

        Ok(Some(records))
    }

    fn read_optional(&self, file: &str) -> Result<Vec<StringRecord>> {
        match self.read_records(file)? {
            Some(records) => Ok(records),
            None => {
                warn!(file, dir = %self.dir.display(), "file missing, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    fn write_records<I>(&self, file: &str, format_line: &str, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let rows: Vec<Vec<String>> = rows.into_iter().collect();
        for value in rows.iter().flatten() {
            check_field(file, value)?;
        }

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create directory {}", self.dir.display()))?;

        let path = self.dir.join(file);
        let tmp_path = self.dir.join(format!("{}.tmp", file));

        let written = write_temp(&tmp_path, format_line, &rows)
            .and_then(|()| {
                fs::rename(&tmp_path, &path)
                    .with_context(|| format!("Failed to replace {}", path.display()))
            });
        if written.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        written
    }
}

fn write_temp(tmp_path: &Path, format_line: &str, rows: &[Vec<String>]) -> Result<()> {
    let mut out = fs::File::create(tmp_path)
        .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
    writeln!(out, "{}", format_line)
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;

    let mut wtr = WriterBuilder::new()
        .delimiter(b'|')
        .flexible(true)
        .quote_style(QuoteStyle::Never)
        .from_writer(out);
    for row in rows {
        wtr.write_record(row)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    }
    wtr.flush()
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    Ok(())
}

/// Refuse values the reader would split, trim or cut short
fn check_field(file: &str, value: &str) -> Result<()> {
    if value.contains('|') || value.chars().any(char::is_control) || value.trim() != value {
        bail!("{}: {:?} would not read back unchanged", file, value);
    }
    Ok(())
}

fn check_lesson(index_number: &str, lesson: &str) -> Result<()> {
    if lesson.is_empty() || lesson.contains(LESSON_SEPARATOR) || lesson.trim() != lesson {
        bail!("index {}: lesson {:?} would not read back unchanged", index_number, lesson);
    }
    Ok(())
}

fn stored_password(password: Option<&PasswordHash>) -> String {
    password.map(PasswordHash::to_string).unwrap_or_default()
}

// ============================================================================
// RECORD PARSING
// ============================================================================

fn field<'r>(record: &'r StringRecord, position: usize, name: &str) -> Result<&'r str> {
    record
        .get(position)
        .filter(|value| !value.is_empty())
        .with_context(|| format!("missing field '{}'", name))
}

fn parse_number(record: &StringRecord, position: usize, name: &str) -> Result<u32> {
    let value = field(record, position, name)?;
    value
        .parse()
        .with_context(|| format!("field '{}' is not a number: {:?}", name, value))
}

fn parse_gender(record: &StringRecord, position: usize) -> Result<Gender> {
    let value = field(record, position, "gender")?;
    Gender::parse(value).with_context(|| format!("unknown gender {:?}", value))
}

fn parse_course(record: &StringRecord) -> Result<Course> {
    let lessons: Vec<String> = record
        .get(5)
        .map(|lessons| {
            lessons
                .split(LESSON_SEPARATOR)
                .map(str::trim)
                .filter(|lesson| !lesson.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(Course::new(
        field(record, 0, "course code")?,
        field(record, 1, "school")?,
        field(record, 2, "index number")?,
        parse_number(record, 3, "vacancy")?,
        parse_number(record, 4, "number of AUs")?,
    )
    .with_lessons(lessons))
}

/// An empty or absent column means the account has no password yet
fn parse_password(record: &StringRecord, position: usize) -> Result<Option<PasswordHash>> {
    match record.get(position).filter(|value| !value.is_empty()) {
        Some(value) => Ok(Some(PasswordHash::parse(value)?)),
        None => Ok(None),
    }
}

fn parse_student(record: &StringRecord) -> Result<Student> {
    let student = Student::new(
        field(record, 0, "name")?,
        field(record, 1, "matric no.")?,
        parse_gender(record, 2)?,
        field(record, 3, "nationality")?,
        field(record, 4, "username")?,
        record.get(5).unwrap_or_default(),
    );

    Ok(match parse_password(record, 6)? {
        Some(password) => student.with_password(password),
        None => student,
    })
}

fn parse_admin(record: &StringRecord) -> Result<Admin> {
    let admin = Admin::new(
        field(record, 0, "name")?,
        field(record, 1, "staff id")?,
        parse_gender(record, 2)?,
        field(record, 3, "nationality")?,
        field(record, 4, "username")?,
    );

    Ok(match parse_password(record, 5)? {
        Some(password) => admin.with_password(password),
        None => admin,
    })
}

fn parse_roster(record: &StringRecord) -> Result<(&str, Vec<&str>)> {
    let index = field(record, 0, "index number")?;
    let students = record.iter().skip(1).filter(|s| !s.is_empty()).collect();
    Ok((index, students))
}

/// A student may appear once per course code across all rosters and waitlists
fn check_membership(
    courses: &CourseRegistry,
    users: &UserRegistry,
    matric_no: &str,
    index: &str,
) -> Result<()> {
    let course = courses.lookup(index)?;
    let student = users.student(matric_no)?;

    if student.held_index_for_code(&course.code, courses).is_some() {
        return Err(EnrollmentError::ConflictingMembership {
            student: matric_no.to_string(),
            code: course.code.clone(),
            index: index.to_string(),
        }
        .into());
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, file: &str, content: &str) {
        fs::write(dir.join(file), content).unwrap();
    }

    fn seed(dir: &Path) {
        write(
            dir,
            COURSES_FILE,
            "format: ...\n\
             CS101|SCSE|X1|1|3|LEC Mon 0930*TUT Wed 1030\n\
             CS101|SCSE|X2|2|3|\n\
             MA101|SPMS|X3|1|4|LEC Fri 0830\n",
        );
        write(
            dir,
            STUDENTS_FILE,
            "format: ...\n\
             Alice Tan|U1|F|Singaporean|alice|alice@e.ntu.edu.sg\n\
             Bob Lim|U2|M|Malaysian|bob|bob@e.ntu.edu.sg\n\
             Chen Wei|U3|M|Chinese|chen|chen@e.ntu.edu.sg\n",
        );
        write(dir, ADMINS_FILE, "format: ...\nRegistrar|STAFF01|F|Singaporean|root\n");
        write(dir, REGISTERED_FILE, "format: ...\nX1|U1\n");
        write(dir, WAITLIST_FILE, "format: ...\nX1|U3|U2\n");
        write(dir, SETTINGS_FILE, "format: ...\n2020-11-01T09:00|2020-11-14T23:59\n");
    }

    #[test]
    fn test_load_full_state() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());

        let state = Storage::new(dir.path()).load().unwrap();

        assert_eq!(state.courses.count(), 3);
        assert_eq!(state.users.count(), 4);

        let x1 = state.courses.lookup("X1").unwrap();
        assert_eq!(x1.lessons, vec!["LEC Mon 0930", "TUT Wed 1030"]);
        assert_eq!(x1.roster(), ["U1".to_string()]);
        let waitlist: Vec<&String> = x1.waitlist().collect();
        assert_eq!(waitlist, vec!["U3", "U2"]);

        assert!(state.users.student("U1").unwrap().is_registered("X1"));
        assert!(state.users.student("U2").unwrap().is_waitlisted("X1"));
        assert!(state.courses.lookup("X2").unwrap().lessons.is_empty());
        assert!(state.access_period.is_some());
    }

    #[test]
    fn test_load_does_not_promote_or_write() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        // Free seats on X2 with a waiting student
        write(dir.path(), REGISTERED_FILE, "format: ...\nX1|U1\n");
        write(dir.path(), WAITLIST_FILE, "format: ...\nX2|U2\n");
        let before = fs::read_to_string(dir.path().join(WAITLIST_FILE)).unwrap();

        let state = Storage::new(dir.path()).load().unwrap();

        let x2 = state.courses.lookup("X2").unwrap();
        assert!(x2.roster().is_empty());
        assert_eq!(x2.waitlist_len(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join(WAITLIST_FILE)).unwrap(),
            before
        );
    }

    #[test]
    fn test_inconsistent_credits_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            COURSES_FILE,
            "format\nCS101|SCSE|X1|1|3|\nCS101|SCSE|X2|1|4|\n",
        );

        let err = Storage::new(dir.path()).load_courses().unwrap_err();
        assert_eq!(
            err.downcast_ref::<EnrollmentError>(),
            Some(&EnrollmentError::InconsistentCreditValue {
                code: "CS101".to_string(),
                first: 3,
                second: 4,
            })
        );
    }

    #[test]
    fn test_roster_over_capacity_rejected() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        write(dir.path(), REGISTERED_FILE, "format: ...\nX1|U1|U2\n");
        write(dir.path(), WAITLIST_FILE, "format: ...\n");

        let err = Storage::new(dir.path()).load().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EnrollmentError>(),
            Some(EnrollmentError::RosterOverCapacity { listed: 2, capacity: 1, .. })
        ));
    }

    #[test]
    fn test_conflicting_membership_rejected() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        write(dir.path(), WAITLIST_FILE, "format: ...\nX2|U1\n");

        let err = Storage::new(dir.path()).load().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EnrollmentError>(),
            Some(EnrollmentError::ConflictingMembership { .. })
        ));
    }

    #[test]
    fn test_unknown_student_in_roster_rejected() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        write(dir.path(), REGISTERED_FILE, "format: ...\nX2|U9\n");

        let err = Storage::new(dir.path()).load().unwrap_err();
        assert_eq!(
            err.downcast_ref::<EnrollmentError>(),
            Some(&EnrollmentError::StudentNotFound("U9".to_string()))
        );
    }

    #[test]
    fn test_missing_courses_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Storage::new(dir.path()).load().is_err());
    }

    #[test]
    fn test_save_then_reload_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let storage = Storage::new(dir.path());
        let state = storage.load().unwrap();

        let out = tempfile::tempdir().unwrap();
        let copy = Storage::new(out.path().join("db"));
        copy.save_courses(&state.courses).unwrap();
        copy.save_users(&state.users).unwrap();
        copy.save_access_period(&state.access_period.unwrap()).unwrap();

        let reloaded = copy.load().unwrap();
        let waitlist: Vec<&String> = reloaded.courses.lookup("X1").unwrap().waitlist().collect();
        assert_eq!(waitlist, vec!["U3", "U2"]);
        assert_eq!(
            reloaded.courses.lookup("X1").unwrap().lessons,
            state.courses.lookup("X1").unwrap().lessons
        );
        assert_eq!(reloaded.access_period, state.access_period);
        assert_eq!(reloaded.users.count(), 4);
        assert!(!out.path().join("db").join("courses.txt.tmp").exists());
    }

    #[test]
    fn test_unstorable_values_refused_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let storage = Storage::new(dir.path());
        let before = fs::read_to_string(dir.path().join(COURSES_FILE)).unwrap();

        for lesson in ["LEC|Mon", "LEC*Mon", "LEC\nMon", " LEC", ""] {
            let courses = CourseRegistry::from_courses(vec![Course::new("CS101", "SCSE", "X1", 1, 3)
                .with_lessons(vec!["TUT Wed".to_string(), lesson.to_string()])])
            .unwrap();

            assert!(storage.save_courses(&courses).is_err(), "{:?} was saved", lesson);
        }

        let piped = CourseRegistry::from_courses(vec![Course::new("CS|101", "SCSE", "X1", 1, 3)])
            .unwrap();
        assert!(storage.save_courses(&piped).is_err());

        assert_eq!(fs::read_to_string(dir.path().join(COURSES_FILE)).unwrap(), before);
        assert!(!dir.path().join("courses.txt.tmp").exists());
    }

    #[test]
    fn test_lessons_read_back_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        let lessons = vec!["LEC Mon 0930-1030 LT1".to_string(), "TUT Wed (odd weeks)".to_string()];
        let courses = CourseRegistry::from_courses(vec![
            Course::new("CS101", "SCSE", "X1", 1, 3).with_lessons(lessons.clone())
        ])
        .unwrap();

        storage.save_courses(&courses).unwrap();

        assert_eq!(storage.load_courses().unwrap(), courses);
        assert_eq!(storage.load_courses().unwrap().lookup("X1").unwrap().lessons, lessons);
    }

    #[test]
    fn test_passwords_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        let users = UserRegistry::from_accounts(vec![
            UserAccount::Student(
                Student::new("Alice Tan", "U1", Gender::Female, "Singaporean", "alice", "alice@e.ntu.edu.sg")
                    .with_password(PasswordHash::new("alice-pw")),
            ),
            UserAccount::Admin(
                Admin::new("Registrar", "STAFF01", Gender::Other, "Singaporean", "root")
                    .with_password(PasswordHash::new("root-pw")),
            ),
            UserAccount::Student(Student::new(
                "Bob Lim", "U2", Gender::Male, "Malaysian", "bob", "bob@e.ntu.edu.sg",
            )),
        ])
        .unwrap();

        storage.save_users(&users).unwrap();
        let reloaded = storage.load_users().unwrap();

        assert_eq!(reloaded, users);
        assert!(reloaded.account("alice").unwrap().verify_password("alice-pw"));
        assert!(reloaded.account("root").unwrap().verify_password("root-pw"));
        assert!(!reloaded.account("bob").unwrap().verify_password(""));
    }

    #[test]
    fn test_malformed_password_column_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), STUDENTS_FILE, "format: ...\nAlice Tan|U1|F|Singaporean|alice|a@e.sg|nothex\n");

        assert!(Storage::new(dir.path()).load_users().is_err());
    }
}
