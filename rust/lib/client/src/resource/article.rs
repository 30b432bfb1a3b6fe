use serde::{Deserialize, Serialize};

use super::{lenient, Endpoints, IdStyle, ImageUpload, ListAuth, Resource};
use crate::image;

/// A blog article. The only searchable entity, and the only one whose
/// id goes in the path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default, deserialize_with = "lenient::id", skip_serializing)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub excerpt: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient::list")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::flag", rename(serialize = "isFeatured"))]
    pub featured: bool,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "image::is_placeholder")]
    pub image: String,
}

impl Resource for Article {
    const ENTITY: &'static str = "Article";
    const ENDPOINTS: Endpoints = Endpoints {
        list: "/Article/List",
        get: "/Article/Detail",
        create: "/Article/Create",
        update: "/Article/Update",
        delete: "/Article/Delete",
        id_style: IdStyle::Path,
    };
    const LIST_AUTH: ListAuth = ListAuth::Optional;
    const SEARCHABLE: bool = true;

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

impl ImageUpload for Article {}
