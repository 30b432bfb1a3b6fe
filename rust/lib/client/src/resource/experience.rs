use serde::{Deserialize, Serialize};

use super::{lenient, Endpoints, IdStyle, ListAuth, Resource};
use crate::image;

/// A work-history entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    #[serde(default, deserialize_with = "lenient::id", skip_serializing)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub company: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
    /// `active` or `completed`.
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: String,
    /// ISO-8601.
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub end_date: Option<String>,
    /// CSV string on the wire.
    #[serde(default, deserialize_with = "lenient::list", serialize_with = "lenient::join_csv")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient::flag", rename(serialize = "isFeatured"))]
    pub featured: bool,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "image::is_placeholder")]
    pub image: String,
}

impl Experience {
    pub fn skill_list(&self) -> &[String] {
        &self.skills
    }

    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

impl Resource for Experience {
    const ENTITY: &'static str = "Experience";
    const ENDPOINTS: Endpoints = Endpoints {
        list: "/Experience/GetList",
        get: "/Experience/GetById",
        create: "/Experience/Create",
        update: "/Experience/Update",
        delete: "/Experience/Delete",
        id_style: IdStyle::Query,
    };
    const LIST_AUTH: ListAuth = ListAuth::Optional;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn status(&self) -> &str {
        &self.status
    }

    fn featured(&self) -> bool {
        self.featured
    }

    fn image(&self) -> &str {
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::normalize_record;
    use serde_json::json;

    #[test]
    fn decodes_backend_record() {
        let raw = json!({
            "id": 4,
            "name": "Backend Engineer",
            "company": "Acme",
            "status": "active",
            "startDate": "2023-01-01T00:00:00Z",
            "endDate": null,
            "skills": "Rust, PostgreSQL",
            "isFavorite": true,
        });
        let exp: Experience = normalize_record(raw.as_object().unwrap().clone()).unwrap();
        assert_eq!(exp.id.as_deref(), Some("4"));
        assert_eq!(exp.title, "Backend Engineer");
        assert_eq!(exp.skill_list(), ["Rust", "PostgreSQL"]);
        assert!(exp.featured);
        assert!(exp.is_active());
        assert_eq!(exp.end_date, None);
        assert_eq!(exp.image, image::PLACEHOLDER_IMAGE);
    }

    #[test]
    fn serializes_wire_shape() {
        let exp = Experience {
            id: Some("4".into()),
            title: "Engineer".into(),
            skills: vec!["Rust".into(), "Go".into()],
            featured: true,
            image: image::PLACEHOLDER_IMAGE.into(),
            ..Default::default()
        };
        let wire = serde_json::to_value(&exp).unwrap();
        assert_eq!(wire["skills"], "Rust, Go");
        assert_eq!(wire["isFeatured"], true);
        assert!(wire.get("id").is_none());
        assert!(wire.get("image").is_none());
        assert!(wire.get("featured").is_none());
    }
}
