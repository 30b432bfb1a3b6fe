use serde::{Deserialize, Serialize};

use super::{lenient, Endpoints, IdStyle, ListAuth, Resource};
use crate::alias::{self, AliasRule};
use crate::image;

const NAME: AliasRule = AliasRule::text("name", &["name", "title"]);
const LEVEL: AliasRule = AliasRule::text("level", &["level", "status"]);

const SKILL_ALIASES: &[AliasRule] = &[
    alias::TITLE,
    NAME,
    alias::STATUS,
    LEVEL,
    alias::FEATURED,
    alias::IMAGE,
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    #[serde(default, deserialize_with = "lenient::id", skip_serializing)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    /// Mirror of `name` for generic display.
    #[serde(default, deserialize_with = "lenient::text", skip_serializing)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub category: String,
    /// `Beginner`, `Intermediate`, `Advanced`, ...
    #[serde(default, deserialize_with = "lenient::text")]
    pub level: String,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing)]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::flag", rename(serialize = "isFeatured"))]
    pub featured: bool,
    #[serde(
        default,
        deserialize_with = "lenient::text",
        rename(serialize = "iconUrl"),
        skip_serializing_if = "image::is_placeholder"
    )]
    pub image: String,
}

impl Resource for Skill {
    const ENTITY: &'static str = "Skill";
    const ENDPOINTS: Endpoints = Endpoints {
        list: "/Skill/GetList",
        get: "/Skill/GetById",
        create: "/Skill/Create",
        update: "/Skill/Update",
        delete: "/Skill/Delete",
        id_style: IdStyle::Query,
    };
    const LIST_AUTH: ListAuth = ListAuth::Public;
    const ALIASES: &'static [AliasRule] = SKILL_ALIASES;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn status(&self) -> &str {
        &self.level
    }

    fn featured(&self) -> bool {
        self.featured
    }

    fn image(&self) -> &str {
        &self.image
    }
}
