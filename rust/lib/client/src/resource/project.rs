use serde::{Deserialize, Serialize};

use super::{lenient, Endpoints, IdStyle, ImageUpload, ListAuth, Resource};
use crate::image;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, deserialize_with = "lenient::id", skip_serializing)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub excerpt: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "image::is_placeholder")]
    pub image: String,
    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub demo_url: Option<String>,
    /// `ongoing` or `completed`.
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::flag", rename(serialize = "isFeatured"))]
    pub featured: bool,
    /// Array or CSV on the wire; always sent as an array.
    #[serde(default, deserialize_with = "lenient::list")]
    pub tech_stack: Vec<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub end_date: Option<String>,
}

impl Project {
    pub fn is_ongoing(&self) -> bool {
        self.status.eq_ignore_ascii_case("ongoing")
    }
}

impl Resource for Project {
    const ENTITY: &'static str = "Project";
    const ENDPOINTS: Endpoints = Endpoints {
        list: "/Project/GetList",
        get: "/Project/GetById",
        create: "/Project/Create",
        update: "/Project/Update",
        delete: "/Project/Delete",
        id_style: IdStyle::Query,
    };
    const LIST_AUTH: ListAuth = ListAuth::Public;

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

impl ImageUpload for Project {}
