//! Template classification of a rendered query.
//!
//! The variants are listed in priority order: when a query matches several
//! template predicates, the earliest one in [`TemplateType::ORDERED`] wins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    Single,
    Preview,
    Page,
    Archive,
    Date,
    Year,
    Month,
    Day,
    Time,
    Author,
    Category,
    Tag,
    Tax,
    Search,
    Feed,
    CommentFeed,
    Trackback,
    Home,
    #[serde(rename = "404")]
    NotFound,
    CommentsPopup,
    Paged,
    Admin,
    Attachment,
    Singular,
    Robots,
    PostsPage,
    PostTypeArchive,
}

impl TemplateType {
    /// Every template type, in evaluation order.
    pub const ORDERED: [TemplateType; 27] = [
        TemplateType::Single,
        TemplateType::Preview,
        TemplateType::Page,
        TemplateType::Archive,
        TemplateType::Date,
        TemplateType::Year,
        TemplateType::Month,
        TemplateType::Day,
        TemplateType::Time,
        TemplateType::Author,
        TemplateType::Category,
        TemplateType::Tag,
        TemplateType::Tax,
        TemplateType::Search,
        TemplateType::Feed,
        TemplateType::CommentFeed,
        TemplateType::Trackback,
        TemplateType::Home,
        TemplateType::NotFound,
        TemplateType::CommentsPopup,
        TemplateType::Paged,
        TemplateType::Admin,
        TemplateType::Attachment,
        TemplateType::Singular,
        TemplateType::Robots,
        TemplateType::PostsPage,
        TemplateType::PostTypeArchive,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateType::Single => "single",
            TemplateType::Preview => "preview",
            TemplateType::Page => "page",
            TemplateType::Archive => "archive",
            TemplateType::Date => "date",
            TemplateType::Year => "year",
            TemplateType::Month => "month",
            TemplateType::Day => "day",
            TemplateType::Time => "time",
            TemplateType::Author => "author",
            TemplateType::Category => "category",
            TemplateType::Tag => "tag",
            TemplateType::Tax => "tax",
            TemplateType::Search => "search",
            TemplateType::Feed => "feed",
            TemplateType::CommentFeed => "comment_feed",
            TemplateType::Trackback => "trackback",
            TemplateType::Home => "home",
            TemplateType::NotFound => "404",
            TemplateType::CommentsPopup => "comments_popup",
            TemplateType::Paged => "paged",
            TemplateType::Admin => "admin",
            TemplateType::Attachment => "attachment",
            TemplateType::Singular => "singular",
            TemplateType::Robots => "robots",
            TemplateType::PostsPage => "posts_page",
            TemplateType::PostTypeArchive => "post_type_archive",
        }
    }

    /// Whether this template is one of the term archive kinds.
    pub fn is_term_archive(self) -> bool {
        matches!(
            self,
            TemplateType::Category | TemplateType::Tag | TemplateType::Tax
        )
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown template type `{0}`")]
pub struct UnknownTemplateType(pub String);

impl FromStr for TemplateType {
    type Err = UnknownTemplateType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TemplateType::ORDERED
            .into_iter()
            .find(|template| template.as_str() == value)
            .ok_or_else(|| UnknownTemplateType(value.to_string()))
    }
}

/// Classify a query against the ordered template list.
///
/// `probe` answers a single predicate: `Some(true)` when it matches,
/// `Some(false)` when it does not, and `None` when the predicate is not
/// available for this query. Unavailable predicates are skipped.
pub fn classify<F>(mut probe: F) -> Option<TemplateType>
where
    F: FnMut(TemplateType) -> Option<bool>,
{
    TemplateType::ORDERED
        .into_iter()
        .find(|template| probe(*template) == Some(true))
}
