//! The three content tools, independent of the MCP transport.

use crate::api::{ContentApi, SearchQuery};
use crate::records::{CommentRecord, PostRecord, PostWithComments};
use crate::time_filter::TimeFilter;
use crate::{RedditError, Result};
use chrono::Utc;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchPostsArgs {
    #[schemars(description = "Search terms")]
    pub query: String,
    #[schemars(description = "Subreddit to search, or \"all\"")]
    #[serde(default = "default_subreddit")]
    pub subreddit: String,
    #[schemars(description = "relevance, hot, top, new or comments")]
    #[serde(default = "default_sort")]
    pub sort: String,
    #[schemars(description = "hour, day, week, month, year or all")]
    #[serde(default = "default_time_filter")]
    pub time_filter: String,
    #[schemars(description = "Maximum number of posts")]
    #[serde(default = "default_post_limit")]
    pub limit: u32,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetSubmissionCommentsArgs {
    #[schemars(description = "Id of the post, without the t3_ prefix")]
    pub post_id: String,
    #[schemars(description = "Maximum number of comments")]
    #[serde(default = "default_comment_limit")]
    pub limit: u32,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchCommentsInPostsArgs {
    #[schemars(description = "Search terms")]
    pub query: String,
    #[schemars(description = "Subreddit to search, or \"all\"")]
    #[serde(default = "default_subreddit")]
    pub subreddit: String,
    #[schemars(description = "Maximum number of posts")]
    #[serde(default = "default_post_limit")]
    pub post_limit: u32,
    #[schemars(description = "Maximum number of comments per post")]
    #[serde(default = "default_comment_limit")]
    pub comment_limit: u32,
    #[schemars(description = "hour, day, week, month, year or all")]
    #[serde(default = "default_time_filter")]
    pub time_filter: String,
}

fn default_subreddit() -> String {
    "all".into()
}

fn default_sort() -> String {
    "relevance".into()
}

fn default_time_filter() -> String {
    TimeFilter::All.as_str().into()
}

fn default_post_limit() -> u32 {
    10
}

fn default_comment_limit() -> u32 {
    20
}

/// Run a blocking API call on the blocking thread pool.
pub async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RedditError::Worker(e.to_string()))?
}

/// Content tools over a shared [`ContentApi`].
#[derive(Clone)]
pub struct ContentTools {
    api: Arc<dyn ContentApi>,
}

impl ContentTools {
    pub fn new(api: Arc<dyn ContentApi>) -> Self {
        Self { api }
    }

    /// Search posts, keeping only those inside the time window.
    pub async fn search_posts(&self, args: SearchPostsArgs) -> Result<Vec<PostRecord>> {
        let time_filter = TimeFilter::parse(&args.time_filter);
        let query = SearchQuery {
            query: args.query,
            subreddit: args.subreddit,
            sort: args.sort,
            time_filter,
            limit: args.limit,
        };
        debug!(?query, "search_posts");

        let api = Arc::clone(&self.api);
        let found = run_blocking(move || api.search(&query)).await?;

        let cutoff = time_filter.cutoff(Utc::now());
        Ok(found
            .into_iter()
            .filter(|post| cutoff.is_none_or(|cutoff| post.created_utc >= cutoff))
            .map(PostRecord::from)
            .collect())
    }

    /// The first `limit` comments of a post, breadth-first.
    pub async fn get_submission_comments(
        &self,
        args: GetSubmissionCommentsArgs,
    ) -> Result<Vec<CommentRecord>> {
        debug!(post_id = %args.post_id, limit = args.limit, "get_submission_comments");
        let api = Arc::clone(&self.api);
        run_blocking(move || comment_records(api.as_ref(), &args.post_id, args.limit)).await
    }

    /// Search posts, then attach each post's comments.
    pub async fn search_comments_in_posts(
        &self,
        args: SearchCommentsInPostsArgs,
    ) -> Result<Vec<PostWithComments>> {
        let posts = self
            .search_posts(SearchPostsArgs {
                query: args.query,
                subreddit: args.subreddit,
                sort: default_sort(),
                time_filter: args.time_filter,
                limit: args.post_limit,
            })
            .await?;

        let mut out = Vec::with_capacity(posts.len());
        for found in posts {
            let api = Arc::clone(&self.api);
            let limit = args.comment_limit;
            let record = run_blocking(move || {
                let post = PostRecord::from(api.submission(&found.id)?);
                let comments = comment_records(api.as_ref(), &post.id, limit)?;
                Ok(PostWithComments { post, comments })
            })
            .await?;
            out.push(record);
        }
        Ok(out)
    }
}

fn comment_records(api: &dyn ContentApi, post_id: &str, limit: u32) -> Result<Vec<CommentRecord>> {
    let mut forest = api.comments(post_id)?;
    forest.replace_more();
    Ok(forest
        .list()
        .into_iter()
        .take(limit as usize)
        .map(CommentRecord::from)
        .collect())
}
