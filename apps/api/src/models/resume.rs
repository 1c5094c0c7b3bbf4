use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resume {
    pub id: Uuid,
    pub name: String,
    /// Plain text of the resume; uploads are converted before storage.
    pub content: String,
    pub skills: Vec<String>,
    /// At most one resume is default at any time.
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewResume {
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl NewResume {
    pub fn into_resume(self) -> Resume {
        let now = Utc::now();
        Resume {
            id: Uuid::new_v4(),
            name: self.name,
            content: self.content,
            skills: self.skills,
            is_default: self.is_default,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResumePatch {
    pub name: Option<String>,
    pub content: Option<String>,
    pub skills: Option<Vec<String>>,
    pub is_default: Option<bool>,
}

impl ResumePatch {
    pub fn apply(self, resume: &mut Resume) {
        if let Some(name) = self.name {
            resume.name = name;
        }
        if let Some(content) = self.content {
            resume.content = content;
        }
        if let Some(skills) = self.skills {
            resume.skills = skills;
        }
        if let Some(is_default) = self.is_default {
            resume.is_default = is_default;
        }
        resume.updated_at = Utc::now();
    }
}
