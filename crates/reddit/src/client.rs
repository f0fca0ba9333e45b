//! Blocking Reddit API client using app-only OAuth.

use crate::api::{Comment, CommentForest, CommentNode, ContentApi, SearchQuery, Submission};
use crate::config::Credentials;
use crate::{RedditError, Result};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Reddit's maximum listing page size.
const PAGE_SIZE: u32 = 100;
/// Refresh the token this long before Reddit says it expires.
const TOKEN_SLACK: Duration = Duration::from_secs(60);

struct Token {
    value: String,
    expires_at: Instant,
}

pub struct RedditClient {
    http: Client,
    credentials: Credentials,
    token: Mutex<Option<Token>>,
}

impl RedditClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        let http = Client::builder()
            .user_agent(credentials.user_agent.clone())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RedditError::Client(e.to_string()))?;
        Ok(Self {
            http,
            credentials,
            token: Mutex::new(None),
        })
    }

    fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.expires_at
        {
            return Ok(token.value.clone());
        }

        debug!("requesting Reddit access token");
        let request = self
            .http
            .post(TOKEN_URL)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")]);
        let grant: TokenGrant = send(request)?;
        let lifetime = Duration::from_secs(grant.expires_in).saturating_sub(TOKEN_SLACK);
        let value = grant.access_token;
        *cached = Some(Token {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let token = self.access_token()?;
        debug!(path, "GET");
        let request = self
            .http
            .get(format!("{API_BASE}{path}"))
            .bearer_auth(token)
            .query(query)
            .query(&[("raw_json", "1")]);
        send(request)
    }
}

impl ContentApi for RedditClient {
    fn search(&self, query: &SearchQuery) -> Result<Vec<Submission>> {
        let path = format!("/r/{}/search", query.subreddit);
        collect_pages(query.limit, |page_size, after| {
            self.get(&path, &search_params(query, page_size, after))
        })
    }

    fn submission(&self, id: &str) -> Result<Submission> {
        let listing: Listing<LinkThing> = self.get(&format!("/by_id/t3_{id}"), &[])?;
        submissions(listing)
            .into_iter()
            .next()
            .ok_or_else(|| RedditError::NotFound(format!("submission {id}")))
    }

    fn comments(&self, submission_id: &str) -> Result<CommentForest> {
        let (_post, comments): (Listing<LinkThing>, Listing<CommentThing>) =
            self.get(&format!("/comments/{submission_id}"), &[])?;
        Ok(forest(comments))
    }
}

/// Query string for one page of a search.
fn search_params(
    query: &SearchQuery,
    page_size: u32,
    after: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("q", query.query.clone()),
        ("sort", query.sort.clone()),
        ("t", query.time_filter.as_str().to_string()),
        ("limit", page_size.to_string()),
    ];
    // Restricting to the "all" pseudo-subreddit matches nothing.
    if !query.subreddit.eq_ignore_ascii_case("all") {
        params.push(("restrict_sr", "true".to_string()));
    }
    if let Some(after) = after {
        params.push(("after", after.to_string()));
    }
    params
}

/// Follow `after` cursors until `limit` posts are collected or the listing ends.
fn collect_pages(
    limit: u32,
    mut fetch: impl FnMut(u32, Option<&str>) -> Result<Listing<LinkThing>>,
) -> Result<Vec<Submission>> {
    let wanted = limit as usize;
    let mut posts = Vec::with_capacity(wanted.min(PAGE_SIZE as usize));
    let mut after: Option<String> = None;

    while posts.len() < wanted {
        let remaining = limit - posts.len() as u32;
        let listing = fetch(remaining.min(PAGE_SIZE), after.as_deref())?;
        let next = listing.data.after.clone();
        let page = submissions(listing);
        if page.is_empty() {
            break;
        }
        posts.extend(page);
        match next {
            Some(cursor) => after = Some(cursor),
            None => break,
        }
    }

    posts.truncate(wanted);
    Ok(posts)
}

fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request
        .send()
        .map_err(|e| RedditError::Network(e.to_string()))?;
    let status = response.status();
    let body = response
        .text()
        .map_err(|e| RedditError::Network(e.to_string()))?;
    if !status.is_success() {
        return Err(status_error(status, body));
    }
    serde_json::from_str(&body).map_err(|e| RedditError::Decode(e.to_string()))
}

fn status_error(status: StatusCode, body: String) -> RedditError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            RedditError::Unauthorized(format!("{status}: {body}"))
        }
        StatusCode::NOT_FOUND => RedditError::NotFound(body),
        StatusCode::TOO_MANY_REQUESTS => RedditError::RateLimited,
        _ => RedditError::Api(format!("{status}: {body}")),
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Deserialize)]
struct TokenGrant {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Deserialize)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Deserialize)]
struct ListingData<T> {
    #[serde(default = "Vec::new")]
    children: Vec<T>,
    /// Cursor for the next page; absent on the last one.
    #[serde(default)]
    after: Option<String>,
}

#[derive(Deserialize)]
struct LinkThing {
    data: LinkData,
}

#[derive(Deserialize)]
struct LinkData {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: u64,
    #[serde(default)]
    created_utc: f64,
}

#[derive(Deserialize)]
#[serde(tag = "kind", content = "data")]
enum CommentThing {
    #[serde(rename = "t1")]
    Comment(CommentData),
    #[serde(rename = "more")]
    More(MoreData),
}

#[derive(Deserialize)]
struct CommentData {
    id: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    replies: Option<Replies>,
}

#[derive(Deserialize)]
struct MoreData {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    children: Vec<String>,
}

/// Reddit sends `""` instead of an empty listing.
#[derive(Deserialize)]
#[serde(untagged)]
enum Replies {
    Listing(Listing<CommentThing>),
    Empty(String),
}

fn submissions(listing: Listing<LinkThing>) -> Vec<Submission> {
    listing
        .data
        .children
        .into_iter()
        .map(|thing| {
            let d = thing.data;
            Submission {
                id: d.id,
                title: d.title,
                selftext: d.selftext,
                url: d.url,
                score: d.score,
                num_comments: d.num_comments,
                created_utc: d.created_utc,
            }
        })
        .collect()
}

fn forest(listing: Listing<CommentThing>) -> CommentForest {
    CommentForest::new(nodes(listing))
}

fn nodes(listing: Listing<CommentThing>) -> Vec<CommentNode> {
    listing
        .data
        .children
        .into_iter()
        .map(|thing| match thing {
            CommentThing::Comment(d) => CommentNode::Comment(Comment {
                id: d.id,
                body: d.body,
                score: d.score,
                created_utc: d.created_utc,
                replies: match d.replies {
                    Some(Replies::Listing(listing)) => nodes(listing),
                    Some(Replies::Empty(_)) | None => Vec::new(),
                },
            }),
            CommentThing::More(d) => CommentNode::More {
                count: d.count,
                children: d.children,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_filter::TimeFilter;
    use serde_json::json;

    #[test]
    fn search_listing_decodes_posts() {
        let body = json!({
            "kind": "Listing",
            "data": {
                "after": null,
                "children": [
                    {"kind": "t3", "data": {
                        "id": "abc", "title": "Rust 2024", "selftext": "",
                        "url": "https://example.com/a", "score": 42,
                        "num_comments": 7, "created_utc": 1700000000.0,
                        "author": "someone"
                    }}
                ]
            }
        });
        let listing: Listing<LinkThing> = serde_json::from_value(body).unwrap();
        let posts = submissions(listing);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "abc");
        assert_eq!(posts[0].score, 42);
        assert_eq!(posts[0].num_comments, 7);
        assert_eq!(posts[0].created_utc, 1700000000.0);
    }

    #[test]
    fn comment_tree_decodes_replies_and_placeholders() {
        let body = json!([
            {"kind": "Listing", "data": {"children": [
                {"kind": "t3", "data": {"id": "abc"}}
            ]}},
            {"kind": "Listing", "data": {"children": [
                {"kind": "t1", "data": {
                    "id": "c1", "body": "top", "score": 3, "created_utc": 1.0,
                    "replies": {"kind": "Listing", "data": {"children": [
                        {"kind": "t1", "data": {
                            "id": "c2", "body": "reply", "score": 1,
                            "created_utc": 2.0, "replies": ""
                        }}
                    ]}}
                }},
                {"kind": "more", "data": {"count": 12, "children": ["c9", "c10"]}}
            ]}}
        ]);
        let (_post, comments): (Listing<LinkThing>, Listing<CommentThing>) =
            serde_json::from_value(body).unwrap();
        let mut forest = forest(comments);

        let ids: Vec<&str> = forest.list().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert_eq!(forest.replace_more(), 1);
    }

    fn query(subreddit: &str) -> SearchQuery {
        SearchQuery {
            query: "rust".into(),
            subreddit: subreddit.into(),
            sort: "relevance".into(),
            time_filter: TimeFilter::Week,
            limit: 10,
        }
    }

    fn param<'a>(params: &'a [(&str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn all_is_searched_unrestricted() {
        for subreddit in ["all", "All"] {
            let params = search_params(&query(subreddit), 10, None);
            assert_eq!(param(&params, "restrict_sr"), None, "{subreddit}");
        }
    }

    #[test]
    fn named_subreddit_is_restricted() {
        let params = search_params(&query("rust"), 25, Some("t3_abc"));
        assert_eq!(param(&params, "restrict_sr"), Some("true"));
        assert_eq!(param(&params, "q"), Some("rust"));
        assert_eq!(param(&params, "t"), Some("week"));
        assert_eq!(param(&params, "limit"), Some("25"));
        assert_eq!(param(&params, "after"), Some("t3_abc"));
    }

    fn page(ids: std::ops::Range<u32>, after: Option<&str>) -> Listing<LinkThing> {
        let children: Vec<_> = ids
            .map(|i| json!({"kind": "t3", "data": {"id": format!("p{i}")}}))
            .collect();
        serde_json::from_value(json!({
            "kind": "Listing",
            "data": {"children": children, "after": after}
        }))
        .unwrap()
    }

    #[test]
    fn listing_cursor_decodes() {
        assert_eq!(page(0..1, Some("t3_p0")).data.after.as_deref(), Some("t3_p0"));
        assert_eq!(page(0..1, None).data.after, None);
    }

    #[test]
    fn pages_follow_cursor_up_to_limit() {
        let mut requests = Vec::new();
        let posts = collect_pages(250, |size, after| {
            requests.push((size, after.map(str::to_string)));
            let start = requests.len() as u32 * 100 - 100;
            Ok(page(start..start + size, Some(&format!("t3_p{}", start + size - 1))))
        })
        .unwrap();

        assert_eq!(posts.len(), 250);
        assert_eq!(posts[249].id, "p249");
        assert_eq!(
            requests,
            vec![
                (100, None),
                (100, Some("t3_p99".to_string())),
                (50, Some("t3_p199".to_string())),
            ]
        );
    }

    #[test]
    fn pages_stop_when_listing_ends() {
        let mut calls = 0;
        let posts = collect_pages(500, |_, _| {
            calls += 1;
            Ok(page(0..30, None))
        })
        .unwrap();
        assert_eq!(posts.len(), 30);
        assert_eq!(calls, 1);
    }

    #[test]
    fn status_codes_map_to_errors() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, String::new()),
            RedditError::Unauthorized(_)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, String::new()),
            RedditError::Unauthorized(_)
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, String::new()),
            RedditError::NotFound(_)
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, String::new()),
            RedditError::RateLimited
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "oops".into()),
            RedditError::Api(msg) if msg.contains("oops")
        ));
    }
}
