//! Plain records returned by the tools.

use crate::api::{Comment, Submission};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub title: String,
    pub selftext: String,
    pub url: String,
    pub score: i64,
    pub num_comments: u64,
    pub created_utc: f64,
}

impl From<Submission> for PostRecord {
    fn from(s: Submission) -> Self {
        Self {
            id: s.id,
            title: s.title,
            selftext: s.selftext,
            url: s.url,
            score: s.score,
            num_comments: s.num_comments,
            created_utc: s.created_utc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub body: String,
    pub score: i64,
    pub created_utc: f64,
}

impl From<&Comment> for CommentRecord {
    fn from(c: &Comment) -> Self {
        Self {
            id: c.id.clone(),
            body: c.body.clone(),
            score: c.score,
            created_utc: c.created_utc,
        }
    }
}

/// A post with its comments attached under `comments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostWithComments {
    #[serde(flatten)]
    pub post: PostRecord,
    pub comments: Vec<CommentRecord>,
}
