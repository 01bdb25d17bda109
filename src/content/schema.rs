//! Section schemas - the typed shape every stored section must keep.
//!
//! Writes are validated by round-tripping the merged value through these
//! types; unknown fields and wrong types are rejected.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::{ContentError, Section};

/// Social profile link shown in the hero and contact sections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
    pub icon: String,
}

/// Hero / landing section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct HeroContent {
    pub name: String,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub primary_button_text: String,
    pub secondary_button_text: String,
    pub cv_file_name: String,
    pub background_image: String,
    pub social_links: Vec<SocialLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Stat {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct AboutStats {
    pub experience: Stat,
    pub projects: Stat,
    pub technologies: Stat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SkillLevel {
    pub name: String,
    pub level: u8,
    pub category: String,
}

/// About section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct AboutContent {
    pub title: String,
    pub paragraph1: String,
    pub paragraph2: String,
    pub profile_image: String,
    pub stats: AboutStats,
    pub skills: Vec<SkillLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SkillCategory {
    pub name: String,
    pub icon: String,
    pub skills: Vec<String>,
}

/// Skills section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SkillsContent {
    pub title: String,
    pub categories: Vec<SkillCategory>,
}

/// Project item of the `projects` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Project {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(default)]
    pub tech: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_demo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Blog post item of `blog.posts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_time: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

/// Blog section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct BlogContent {
    pub title: String,
    pub posts: Vec<BlogPost>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ContactForm {
    pub enabled: bool,
    pub fields: Vec<String>,
    pub email_notifications: bool,
}

/// Contact section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ContactContent {
    pub title: String,
    pub subtitle: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub social_links: Vec<SocialLink>,
    pub contact_form: ContactForm,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Analytics {
    pub google_analytics: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Seo {
    pub keywords: Vec<String>,
    pub og_image: String,
}

/// Site-wide configuration section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SiteConfig {
    pub site_name: String,
    pub site_description: String,
    pub site_url: String,
    pub theme: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub analytics: Analytics,
    pub seo: Seo,
}

/// Singleton maintenance-mode record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct MaintenanceRecord {
    pub is_globally_active: bool,
    pub message: String,
    pub estimated_time: String,
    pub last_updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Address shown on the maintenance page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

impl MaintenanceRecord {
    /// A window with both bounds must end after it starts.
    pub fn has_valid_schedule(&self) -> bool {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => start < end,
            _ => true,
        }
    }

    /// Time left until `end_date`, if it is still ahead of `now`.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.end_date
            .map(|end| end - now)
            .filter(|left| *left > chrono::Duration::zero())
    }
}

/// Partial maintenance update; only provided fields override the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MaintenancePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_globally_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

/// Contact form submission. Logged, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

fn normalize<T: DeserializeOwned + Serialize>(section: Section, value: Value) -> Result<Value, ContentError> {
    let typed: T =
        serde_json::from_value(value).map_err(|source| ContentError::Schema { section, source })?;
    serde_json::to_value(typed).map_err(|source| ContentError::Schema { section, source })
}

/// Validate a full section value and return it in canonical form.
pub fn validate(section: Section, value: Value) -> Result<Value, ContentError> {
    match section {
        Section::Hero => normalize::<HeroContent>(section, value),
        Section::About => normalize::<AboutContent>(section, value),
        Section::Skills => normalize::<SkillsContent>(section, value),
        Section::Projects => normalize::<Vec<Project>>(section, value),
        Section::Blog => normalize::<BlogContent>(section, value),
        Section::Contact => normalize::<ContactContent>(section, value),
        Section::Config => normalize::<SiteConfig>(section, value),
        Section::Maintenance => {
            let record: MaintenanceRecord = serde_json::from_value(value)
                .map_err(|source| ContentError::Schema { section, source })?;
            if !record.has_valid_schedule() {
                return Err(ContentError::InvalidSchedule);
            }
            serde_json::to_value(record).map_err(|source| ContentError::Schema { section, source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_maintenance_window_must_end_after_start() {
        let record = json!({
            "isGloballyActive": true,
            "startDate": "2030-01-02T00:00:00Z",
            "endDate": "2030-01-01T00:00:00Z"
        });
        assert!(matches!(
            validate(Section::Maintenance, record),
            Err(ContentError::InvalidSchedule)
        ));

        let open_ended = json!({ "startDate": "2030-01-02T00:00:00Z" });
        assert!(validate(Section::Maintenance, open_ended).is_ok());
    }

    #[test]
    fn test_remaining_only_while_end_is_ahead() {
        let now = Utc::now();
        let record = MaintenanceRecord {
            end_date: Some(now + chrono::Duration::minutes(90)),
            ..Default::default()
        };
        assert_eq!(record.remaining(now), Some(chrono::Duration::minutes(90)));
        assert!(record.remaining(now + chrono::Duration::hours(2)).is_none());
        assert!(MaintenanceRecord::default().remaining(now).is_none());
    }

    #[test]
    fn test_every_default_section_is_valid() {
        let now = Utc::now();
        for section in Section::ALL {
            let value = crate::content::defaults::section(section, now);
            let normalized = validate(section, value.clone()).unwrap();
            assert_eq!(normalized, value, "default {section} is not canonical");
        }
    }

    #[test]
    fn test_nested_unknown_field_is_rejected() {
        let mut about = crate::content::defaults::section(Section::About, Utc::now());
        about["stats"]["experience"]["emoji"] = json!("rocket");
        assert!(validate(Section::About, about).is_err());
    }

    #[test]
    fn test_project_optional_fields_are_omitted_when_absent() {
        let value = validate(Section::Projects, json!([{ "id": "1", "title": "Kernel" }])).unwrap();
        let project = &value[0];
        assert_eq!(project["title"], "Kernel");
        assert_eq!(project["tech"], json!([]));
        assert!(project.get("image").is_none());
    }

    #[test]
    fn test_maintenance_patch_rejects_last_updated() {
        let result = serde_json::from_value::<MaintenancePatch>(json!({
            "lastUpdated": "2025-01-01T00:00:00Z"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_maintenance_patch_serializes_only_given_fields() {
        let patch = MaintenancePatch {
            message: Some("Upgrading".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "message": "Upgrading" }));
    }

    #[test]
    fn test_contact_submission_requires_message() {
        let result = serde_json::from_value::<ContactSubmission>(json!({
            "name": "Ada",
            "email": "ada@example.com"
        }));
        assert!(result.is_err());
    }
}
