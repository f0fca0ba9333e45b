//! The content API seam: the operations the tools need from Reddit.
//!
//! Implementations are blocking; callers are expected to run them off the
//! async scheduler (see [`ContentTools`](crate::ContentTools)).

use crate::Result;
use crate::time_filter::TimeFilter;
use std::collections::VecDeque;

/// A post as returned by the API.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub id: String,
    pub title: String,
    pub selftext: String,
    pub url: String,
    pub score: i64,
    pub num_comments: u64,
    /// Creation time, UNIX seconds.
    pub created_utc: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: String,
    pub body: String,
    pub score: i64,
    pub created_utc: f64,
    pub replies: Vec<CommentNode>,
}

/// A node in a comment tree.
#[derive(Debug, Clone, PartialEq)]
pub enum CommentNode {
    Comment(Comment),
    /// A "load more comments" placeholder standing in for unfetched children.
    More { count: u64, children: Vec<String> },
}

/// The comment tree of one submission.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommentForest {
    roots: Vec<CommentNode>,
    expanded: bool,
}

impl CommentForest {
    pub fn new(roots: Vec<CommentNode>) -> Self {
        Self {
            roots,
            expanded: false,
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Drop every "load more" placeholder without fetching it.
    ///
    /// Returns the number of placeholders removed. Once expanded, further
    /// calls do nothing and return 0.
    pub fn replace_more(&mut self) -> usize {
        if self.expanded {
            return 0;
        }
        self.expanded = true;
        prune_more(&mut self.roots)
    }

    /// All comments, breadth-first: every top-level comment, then every
    /// second-level reply, and so on.
    pub fn list(&self) -> Vec<&Comment> {
        let mut out = Vec::new();
        let mut queue: VecDeque<&CommentNode> = self.roots.iter().collect();
        while let Some(node) = queue.pop_front() {
            if let CommentNode::Comment(comment) = node {
                out.push(comment);
                queue.extend(comment.replies.iter());
            }
        }
        out
    }
}

fn prune_more(nodes: &mut Vec<CommentNode>) -> usize {
    let before = nodes.len();
    nodes.retain(|node| matches!(node, CommentNode::Comment(_)));
    let mut removed = before - nodes.len();
    for node in nodes.iter_mut() {
        if let CommentNode::Comment(comment) = node {
            removed += prune_more(&mut comment.replies);
        }
    }
    removed
}

/// Parameters of a post search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub subreddit: String,
    pub sort: String,
    pub time_filter: TimeFilter,
    pub limit: u32,
}

/// Blocking read access to a content provider.
pub trait ContentApi: Send + Sync {
    /// Search posts, returning them in the provider's order.
    fn search(&self, query: &SearchQuery) -> Result<Vec<Submission>>;

    /// Fetch a single post by id.
    fn submission(&self, id: &str) -> Result<Submission>;

    /// Fetch the comment tree of a post.
    fn comments(&self, submission_id: &str) -> Result<CommentForest>;
}
