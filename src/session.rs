// 🔑 Session & access period
//
// A Session is the explicit "who is logged in" value handed to every
// operation. Opening one checks the account's password first; students are
// then only let in during the admin-configured access period. Admins are
// never gated.

use anyhow::Context;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entities::{Role, UserAccount, UserRegistry};
use crate::error::{EnrollmentError, Result};

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

// ============================================================================
// ACCESS PERIOD
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl AccessPeriod {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> anyhow::Result<Self> {
        if start >= end {
            anyhow::bail!("Access period must start before it ends ({} >= {})", start, end);
        }
        Ok(AccessPeriod { start, end })
    }

    /// Parse two timestamps, e.g. `2020-11-01T09:00` and `2020-11-14T23:59:59`
    pub fn parse(start: &str, end: &str) -> anyhow::Result<Self> {
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    /// Inclusive at both ends
    pub fn is_open(&self, now: NaiveDateTime) -> bool {
        self.start <= now && now <= self.end
    }
}

impl fmt::Display for AccessPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%dT%H:%M:%S"),
            self.end.format("%Y-%m-%dT%H:%M:%S")
        )
    }
}

pub fn parse_timestamp(value: &str) -> anyhow::Result<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .with_context(|| format!("Invalid timestamp: {:?}", value))
}

// ============================================================================
// SESSION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    username: String,
    role: Role,
    student_id: Option<String>,
}

impl Session {
    /// Log in with a username and password
    ///
    /// An unknown username and a wrong password give the same
    /// `InvalidCredentials`. Students are refused outside the access period,
    /// and always refused when no period has been configured.
    pub fn open(
        users: &UserRegistry,
        username: &str,
        password: &str,
        access: Option<&AccessPeriod>,
        now: NaiveDateTime,
    ) -> Result<Session> {
        let account = users
            .account(username)
            .filter(|account| account.verify_password(password))
            .ok_or(EnrollmentError::InvalidCredentials)?;

        let student_id = match account {
            UserAccount::Student(student) => {
                if !access.is_some_and(|period| period.is_open(now)) {
                    return Err(EnrollmentError::AccessClosed);
                }
                Some(student.matric_no.clone())
            }
            UserAccount::Admin(_) => None,
        };

        Ok(Session {
            username: username.to_string(),
            role: account.role(),
            student_id,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Matriculation number of the acting student
    pub fn student_id(&self) -> Result<&str> {
        match (self.role, &self.student_id) {
            (Role::Student, Some(id)) => Ok(id.as_str()),
            _ => Err(self.wrong_role()),
        }
    }

    pub fn require_admin(&self) -> Result<()> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Student => Err(self.wrong_role()),
        }
    }

    fn wrong_role(&self) -> EnrollmentError {
        EnrollmentError::WrongRole {
            username: self.username.clone(),
            role: self.role.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Admin, Gender, Student};
    use crate::password::PasswordHash;

    fn users() -> UserRegistry {
        UserRegistry::from_accounts(vec![
            UserAccount::Student(
                Student::new(
                    "Alice Tan",
                    "U1",
                    Gender::Female,
                    "Singaporean",
                    "alice",
                    "alice@e.ntu.edu.sg",
                )
                .with_password(PasswordHash::new("alice-pw")),
            ),
            UserAccount::Student(Student::new(
                "Bob Lim",
                "U2",
                Gender::Male,
                "Malaysian",
                "bob",
                "bob@e.ntu.edu.sg",
            )),
            UserAccount::Admin(
                Admin::new("Registrar", "STAFF01", Gender::Male, "Singaporean", "root")
                    .with_password(PasswordHash::new("root-pw")),
            ),
        ])
        .unwrap()
    }

    fn period() -> AccessPeriod {
        AccessPeriod::parse("2020-11-01T09:00", "2020-11-14T23:59:59").unwrap()
    }

    fn inside() -> NaiveDateTime {
        parse_timestamp("2020-11-02T10:00").unwrap()
    }

    #[test]
    fn test_parse_and_window() {
        let access = period();

        assert!(access.is_open(parse_timestamp("2020-11-01T09:00").unwrap()));
        assert!(access.is_open(parse_timestamp("2020-11-05 12:30").unwrap()));
        assert!(!access.is_open(parse_timestamp("2020-11-15T00:00").unwrap()));
        assert!(parse_timestamp("yesterday").is_err());
        assert!(AccessPeriod::parse("2020-11-14T00:00", "2020-11-01T00:00").is_err());
    }

    #[test]
    fn test_student_gated_by_access_period() {
        let users = users();
        let access = period();

        let session = Session::open(&users, "alice", "alice-pw", Some(&access), inside()).unwrap();
        assert_eq!(session.student_id().unwrap(), "U1");
        assert!(session.require_admin().is_err());

        let outside = parse_timestamp("2021-01-01T10:00").unwrap();
        assert_eq!(
            Session::open(&users, "alice", "alice-pw", Some(&access), outside),
            Err(EnrollmentError::AccessClosed)
        );
        assert_eq!(
            Session::open(&users, "alice", "alice-pw", None, inside()),
            Err(EnrollmentError::AccessClosed)
        );
    }

    #[test]
    fn test_admin_not_gated() {
        let users = users();
        let outside = parse_timestamp("2021-01-01T10:00").unwrap();

        let session = Session::open(&users, "root", "root-pw", None, outside).unwrap();
        assert_eq!(session.role(), Role::Admin);
        assert!(session.require_admin().is_ok());
        assert!(matches!(
            session.student_id(),
            Err(EnrollmentError::WrongRole { .. })
        ));
    }

    #[test]
    fn test_credentials_checked_before_anything_else() {
        let users = users();
        let access = period();

        // Wrong password for an admin, and for a student outside the window
        assert_eq!(
            Session::open(&users, "root", "alice-pw", None, inside()),
            Err(EnrollmentError::InvalidCredentials)
        );
        assert_eq!(
            Session::open(&users, "alice", "wrong", None, inside()),
            Err(EnrollmentError::InvalidCredentials)
        );
        assert_eq!(
            Session::open(&users, "mallory", "alice-pw", Some(&access), inside()),
            Err(EnrollmentError::InvalidCredentials)
        );
        // No stored password: nothing unlocks the account
        assert_eq!(
            Session::open(&users, "bob", "", Some(&access), inside()),
            Err(EnrollmentError::InvalidCredentials)
        );
    }
}
