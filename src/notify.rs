// 📬 Promotion notifications
//
// The engine never performs I/O. It hands back one PromotionEvent per student
// moved off a waitlist, and the caller fans them out to whatever notifiers it
// has configured (log line, audit log, a mailer).

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionEvent {
    pub student_id: String,
    pub index_number: String,
    pub course_code: String,
    pub promoted_at: DateTime<Utc>,
}

impl PromotionEvent {
    pub fn new(student_id: &str, index_number: &str, course_code: &str) -> Self {
        PromotionEvent {
            student_id: student_id.to_string(),
            index_number: index_number.to_string(),
            course_code: course_code.to_string(),
            promoted_at: Utc::now(),
        }
    }

    pub fn message(&self) -> String {
        format!(
            "Student {} has been moved from the waitlist into {} (index {})",
            self.student_id, self.course_code, self.index_number
        )
    }
}

pub trait Notifier {
    fn notify(&mut self, event: &PromotionEvent) -> Result<()>;
}

/// Simulated e-mail: one log line per promotion
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, event: &PromotionEvent) -> Result<()> {
        info!(
            student = %event.student_id,
            index = %event.index_number,
            "email sent: {}",
            event.message()
        );
        Ok(())
    }
}

/// Keeps every event it sees
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub events: Vec<PromotionEvent>,
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, event: &PromotionEvent) -> Result<()> {
        self.events.push(event.clone());
        Ok(())
    }
}

/// Deliver every event to every notifier.
///
/// Failures are collected and returned; every notifier still sees every event.
pub fn dispatch(events: &[PromotionEvent], notifiers: &mut [&mut dyn Notifier]) -> Vec<anyhow::Error> {
    let mut failures = Vec::new();

    for event in events {
        for notifier in notifiers.iter_mut() {
            if let Err(e) = notifier.notify(event) {
                warn!(student = %event.student_id, "promotion notification failed: {:#}", e);
                failures.push(e);
            }
        }
    }

    failures
}
