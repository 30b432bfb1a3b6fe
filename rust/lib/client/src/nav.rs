//! Role-based navigation policy.
//!
//! A pure mapping from the session's role to the menu actions the UI
//! shows. Total over every input: unknown roles get the read-only menu,
//! no session gets the public menu.

use crate::claims::{Claims, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Home,
    About,
    Login,
    Logout,
    ViewExperience,
    ViewSkills,
    ViewProjects,
    ViewArticles,
    ManageExperience,
    ManageSkills,
    ManageProject,
    ManageArticle,
}

impl Action {
    /// Menu label. Management and read-only entries share labels so the
    /// menu looks the same for every role.
    pub fn label(self) -> &'static str {
        match self {
            Action::Home => "Home",
            Action::About => "About Me",
            Action::Login => "Login",
            Action::Logout => "Logout",
            Action::ViewExperience | Action::ManageExperience => "Experience",
            Action::ViewSkills | Action::ManageSkills => "Skills",
            Action::ViewProjects | Action::ManageProject => "Projects",
            Action::ViewArticles | Action::ManageArticle => "Articles",
        }
    }

    pub fn route(self) -> &'static str {
        match self {
            Action::Home => "/",
            Action::About => "/about",
            Action::Login => "/form",
            Action::Logout => "/logout",
            Action::ViewExperience => "/experience",
            Action::ViewSkills => "/skills",
            Action::ViewProjects => "/projects",
            Action::ViewArticles => "/articles",
            Action::ManageExperience => "/admin/experience",
            Action::ManageSkills => "/admin/skills",
            Action::ManageProject => "/admin/projects",
            Action::ManageArticle => "/admin/articles",
        }
    }

    pub fn is_management(self) -> bool {
        matches!(
            self,
            Action::ManageExperience
                | Action::ManageSkills
                | Action::ManageProject
                | Action::ManageArticle
        )
    }
}

const PUBLIC: &[Action] = &[Action::Home, Action::Login];

const READER: &[Action] = &[
    Action::Home,
    Action::About,
    Action::ViewExperience,
    Action::ViewSkills,
    Action::ViewProjects,
    Action::ViewArticles,
    Action::Logout,
];

const OWNER: &[Action] = &[
    Action::Home,
    Action::About,
    Action::ManageExperience,
    Action::ManageSkills,
    Action::ManageProject,
    Action::ManageArticle,
    Action::Logout,
];

/// Actions visible for `role`; `None` means not logged in.
pub fn visible_actions(role: Option<Role>) -> &'static [Action] {
    match role {
        None => PUBLIC,
        Some(Role::Owner) => OWNER,
        Some(Role::Reviewer | Role::Viewer) => READER,
    }
}

/// Actions for a decoded session. An authenticated token without any role
/// claim counts as a plain viewer.
pub fn actions_for_session(claims: Option<&Claims>) -> &'static [Action] {
    match claims {
        None => PUBLIC,
        Some(claims) => visible_actions(Some(claims.role.unwrap_or(Role::Viewer))),
    }
}
