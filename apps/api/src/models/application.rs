use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Draft,
    Applied,
    Interviewing,
    Rejected,
    Offer,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Draft,
        ApplicationStatus::Applied,
        ApplicationStatus::Interviewing,
        ApplicationStatus::Rejected,
        ApplicationStatus::Offer,
        ApplicationStatus::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Interviewing => "interviewing",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Offer => "offer",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    /// Once submitted, an application never returns to draft.
    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        *self == next || *self == ApplicationStatus::Draft || next != ApplicationStatus::Draft
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown application status '{s}'"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub resume_id: Uuid,
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    pub notes: Option<String>,
    /// Stamped the first time the status becomes `applied`; never cleared.
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub resume_id: Uuid,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewApplication {
    pub fn into_application(self) -> Application {
        let now = Utc::now();
        let applied_at = (self.status == ApplicationStatus::Applied).then_some(now);
        Application {
            id: Uuid::new_v4(),
            job_id: self.job_id,
            resume_id: self.resume_id,
            status: self.status,
            cover_letter: self.cover_letter,
            notes: self.notes,
            applied_at,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationPatch {
    pub status: Option<ApplicationStatus>,
    pub cover_letter: Option<String>,
    pub notes: Option<String>,
}

impl ApplicationPatch {
    /// Applies the patch, rejecting transitions back to draft.
    pub fn apply(self, application: &mut Application) -> Result<(), String> {
        if let Some(next) = self.status {
            if !application.status.can_transition_to(next) {
                return Err(format!(
                    "cannot move application from '{}' to '{}'",
                    application.status.as_str(),
                    next.as_str()
                ));
            }
            if next == ApplicationStatus::Applied && application.applied_at.is_none() {
                application.applied_at = Some(Utc::now());
            }
            application.status = next;
        }
        if let Some(cover_letter) = self.cover_letter {
            application.cover_letter = Some(cover_letter);
        }
        if let Some(notes) = self.notes {
            application.notes = Some(notes);
        }
        application.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> Application {
        NewApplication {
            job_id: Uuid::new_v4(),
            resume_id: Uuid::new_v4(),
            status: ApplicationStatus::Draft,
            cover_letter: None,
            notes: None,
        }
        .into_application()
    }

    #[test]
    fn test_applied_at_is_stamped_once() {
        let mut app = draft();
        assert!(app.applied_at.is_none());

        ApplicationPatch {
            status: Some(ApplicationStatus::Applied),
            ..Default::default()
        }
        .apply(&mut app)
        .unwrap();
        let first = app.applied_at.expect("applied_at should be set");

        ApplicationPatch {
            status: Some(ApplicationStatus::Interviewing),
            ..Default::default()
        }
        .apply(&mut app)
        .unwrap();
        assert_eq!(app.applied_at, Some(first));
    }

    #[test]
    fn test_cannot_return_to_draft() {
        let mut app = draft();
        app.status = ApplicationStatus::Rejected;
        let err = ApplicationPatch {
            status: Some(ApplicationStatus::Draft),
            ..Default::default()
        }
        .apply(&mut app)
        .unwrap_err();
        assert!(err.contains("rejected"));
        assert_eq!(app.status, ApplicationStatus::Rejected);
    }

    #[test]
    fn test_created_as_applied_sets_applied_at() {
        let app = NewApplication {
            job_id: Uuid::new_v4(),
            resume_id: Uuid::new_v4(),
            status: ApplicationStatus::Applied,
            cover_letter: None,
            notes: None,
        }
        .into_application();
        assert!(app.applied_at.is_some());
    }

    #[test]
    fn test_status_parses_all_variants() {
        for status in ApplicationStatus::ALL {
            assert_eq!(status.as_str().parse::<ApplicationStatus>().unwrap(), status);
        }
    }
}
