use serde::{Deserialize, Serialize};

use super::{ArticleId, EntityKind, ImageRef, TagId, Timestamp, VersionedEntity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<TagId>,
    pub thumbnail: Option<ImageRef>,
    pub last_modified_at: Timestamp,
}

impl Article {
    pub fn has_tag(&self, tag: &TagId) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Copy of this article with a different thumbnail.
    pub fn with_thumbnail(&self, thumbnail: Option<ImageRef>) -> Self {
        Self {
            thumbnail,
            ..self.clone()
        }
    }
}

impl VersionedEntity for Article {
    type Id = ArticleId;
    type Filter = TagId;

    const KIND: EntityKind = EntityKind::Article;

    fn id(&self) -> &ArticleId {
        &self.id
    }

    fn last_modified_at(&self) -> Timestamp {
        self.last_modified_at
    }

    fn matches(&self, tag: &TagId) -> bool {
        self.has_tag(tag)
    }
}
