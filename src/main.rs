//! Enrollment CLI - main entry point
//!
//! Loads the text-file store, logs `--user` in, runs one command through the
//! engine and saves the result. A change is only announced (success line,
//! promotion notices, audit rows) once it has been saved.

mod cli;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use course_enrollment::{
    dispatch, AccessPeriod, AuditLog, CourseRegistry, EnrollmentConfig, EnrollmentEngine,
    EnrollmentError, EnrollmentEvent, Gender, LoadedState, LogNotifier, Notifier, PasswordHash,
    PromotionEvent, Session, Storage, Student, UserRegistry,
};

use crate::cli::{Cli, Commands};

const PASSWORD_ENV: &str = "ENROLLMENT_PASSWORD";

/// Initialize tracing; RUST_LOG overrides the default `info` level
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    if let Commands::HashPassword { plain } = &cli.command {
        println!("{}", PasswordHash::new(plain));
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => EnrollmentConfig::load_from_file(path)?,
        None => EnrollmentConfig::default(),
    };
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }

    let storage = Storage::from_config(&config);
    let LoadedState {
        courses,
        users,
        access_period,
    } = storage.load()?;

    let audit = match &config.audit_db {
        Some(path) => Some(AuditLog::open(path)?),
        None => None,
    };

    let username = cli.user.as_deref().context("--user is required")?;
    let password = match cli.password.clone() {
        Some(password) => password,
        None => std::env::var(PASSWORD_ENV)
            .with_context(|| format!("Pass --password or set {}", PASSWORD_ENV))?,
    };

    let now = Local::now().naive_local();
    let session = Session::open(&users, username, &password, access_period.as_ref(), now)?;
    info!(user = session.username(), role = session.role().as_str(), "session opened");

    let mut app = App {
        engine: EnrollmentEngine::from_config(&config),
        storage,
        courses,
        users,
        access_period,
        session,
        audit,
        notifiers: vec![Box::new(LogNotifier)],
    };

    app.run(cli.command)
}

struct App {
    engine: EnrollmentEngine,
    storage: Storage,
    courses: CourseRegistry,
    users: UserRegistry,
    access_period: Option<AccessPeriod>,
    session: Session,
    audit: Option<AuditLog>,
    notifiers: Vec<Box<dyn Notifier>>,
}

impl App {
    fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Add { index } => {
                let student_id = self.session.student_id()?.to_string();
                let placement =
                    self.engine
                        .add_course(&mut self.courses, &mut self.users, &student_id, &index)?;

                let event = EnrollmentEvent::course_added(
                    &student_id,
                    &index,
                    &self.course_code(&index),
                    placement,
                    self.session.username(),
                );
                self.commit(&event, &[])?;
                println!("✓ Index {} added ({})", index, placement.as_str());
                Ok(())
            }

            Commands::Drop { index } => {
                let student_id = self.session.student_id()?.to_string();
                let outcome =
                    self.engine
                        .drop_course(&mut self.courses, &mut self.users, &student_id, &index)?;

                let event = EnrollmentEvent::course_dropped(
                    &student_id,
                    &index,
                    &self.course_code(&index),
                    &outcome,
                    self.session.username(),
                );
                self.commit(&event, &outcome.promotions)?;
                println!("✓ Index {} dropped ({})", index, outcome.dropped.as_str());
                Ok(())
            }

            Commands::Change { from, to } => {
                let student_id = self.session.student_id()?.to_string();
                let outcome = self.engine.change_index(
                    &mut self.courses,
                    &mut self.users,
                    &student_id,
                    &from,
                    &to,
                )?;

                let event = EnrollmentEvent::index_changed(
                    &student_id,
                    &self.course_code(&to),
                    &outcome,
                    self.session.username(),
                );
                self.commit(&event, &outcome.promotions)?;
                println!("✓ Index changed from {} to {}", from, to);
                Ok(())
            }

            Commands::Swap {
                index,
                peer,
                peer_index,
            } => {
                let student_id = self.session.student_id()?.to_string();
                let peer_id = self
                    .users
                    .account(&peer)
                    .and_then(|account| account.as_student())
                    .map(|student| student.matric_no.clone())
                    .with_context(|| format!("No student account named {}", peer))?;

                let outcome = self.engine.swap_index(
                    &mut self.courses,
                    &mut self.users,
                    &student_id,
                    &index,
                    &peer_id,
                    &peer_index,
                )?;

                let event = EnrollmentEvent::index_swapped(
                    &self.course_code(&index),
                    &outcome,
                    self.session.username(),
                );
                self.commit(&event, &[])?;
                println!(
                    "✓ Swapped: you now hold {}, {} now holds {}",
                    outcome.index_a, peer, outcome.index_b
                );
                Ok(())
            }

            Commands::Vacancy { index } => {
                let course = self.courses.lookup(&index)?;
                println!(
                    "{} {} index {}: {}/{} seats free, {} waitlisted",
                    course.code,
                    course.school,
                    course.index_number,
                    course.vacancies(),
                    course.capacity,
                    course.waitlist_len()
                );
                Ok(())
            }

            Commands::Courses => {
                let student = self.users.student(self.session.student_id()?)?;

                println!("Registered ({} AUs):", student.credit_total(&self.courses));
                for course in student.registered_courses(&self.courses) {
                    println!("  {} index {} ({} AUs)", course.code, course.index_number, course.credits);
                }
                println!("Waitlisted:");
                for course in student.waitlisted_courses(&self.courses) {
                    println!("  {} index {}", course.code, course.index_number);
                }
                Ok(())
            }

            Commands::ListIndex { index } => {
                self.session.require_admin()?;
                let students = self.users.students_on_index(&self.courses, &index)?;

                println!("Index {}: {} registered", index, students.len());
                for student in students {
                    println!(
                        "  {} {} {} {}",
                        student.matric_no,
                        student.name,
                        student.gender.as_str(),
                        student.nationality
                    );
                }
                Ok(())
            }

            Commands::ListCourse { code } => {
                self.session.require_admin()?;
                let students = self.users.students_on_course_code(&self.courses, &code);

                println!("Course {}: {} registered", code, students.len());
                for student in students {
                    println!(
                        "  {} {} {} {}",
                        student.matric_no,
                        student.name,
                        student.gender.as_str(),
                        student.nationality
                    );
                }
                Ok(())
            }

            Commands::AddStudent {
                name,
                matric,
                gender,
                nationality,
                username,
                email,
                new_password,
            } => {
                self.session.require_admin()?;

                let gender = Gender::parse(&gender).ok_or_else(|| EnrollmentError::InvalidField {
                    field: "gender",
                    value: gender.clone(),
                })?;
                if new_password.is_empty() {
                    return Err(EnrollmentError::InvalidField {
                        field: "password",
                        value: String::new(),
                    }
                    .into());
                }

                let student = Student::new(name, matric.as_str(), gender, nationality, username, email)
                    .with_password(PasswordHash::new(&new_password));
                self.users.add_student(student)?;
                self.storage
                    .save_users(&self.users)
                    .context("Student added in this session but could not be saved")?;

                println!("✓ Student {} added ({} students)", matric, self.users.students().count());
                Ok(())
            }

            Commands::HashPassword { plain } => {
                println!("{}", PasswordHash::new(&plain));
                Ok(())
            }

            Commands::AccessPeriod { start, end } => {
                self.session.require_admin()?;

                match &self.access_period {
                    Some(period) => println!("Current access period: {}", period),
                    None => println!("No access period configured"),
                }

                if let (Some(start), Some(end)) = (start, end) {
                    let period = AccessPeriod::parse(&start, &end)?;
                    self.storage.save_access_period(&period)?;
                    self.access_period = Some(period);
                    println!("✓ New access period: {}", period);
                }
                Ok(())
            }
        }
    }

    /// Save, then notify promoted students, then audit
    ///
    /// Only the save can fail the command; notification and audit failures
    /// are reported and the saved change stands.
    fn commit(&mut self, event: &EnrollmentEvent, promotions: &[PromotionEvent]) -> Result<()> {
        self.storage
            .save_courses(&self.courses)
            .context("Change applied in this session but could not be saved")?;

        self.notify(promotions);
        self.record(event);
        Ok(())
    }

    fn notify(&mut self, promotions: &[PromotionEvent]) {
        let mut notifiers: Vec<&mut dyn Notifier> = Vec::new();
        for notifier in self.notifiers.iter_mut() {
            notifiers.push(notifier.as_mut());
        }
        if let Some(audit) = self.audit.as_mut() {
            notifiers.push(audit);
        }

        let failures = dispatch(promotions, &mut notifiers);
        if !failures.is_empty() {
            eprintln!("⚠️  {} promotion notification(s) could not be delivered", failures.len());
        }
    }

    fn record(&self, event: &EnrollmentEvent) {
        let Some(audit) = &self.audit else {
            return;
        };

        if let Err(e) = audit.record(event) {
            warn!(kind = %event.kind, student = %event.student_id, "audit record failed: {:#}", e);
            eprintln!("⚠️  Audit log not updated: {:#}", e);
        }
    }

    fn course_code(&self, index: &str) -> String {
        self.courses
            .lookup(index)
            .map(|course| course.code.clone())
            .unwrap_or_default()
    }
}
