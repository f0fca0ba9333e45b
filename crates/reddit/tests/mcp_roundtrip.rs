//! The Reddit server and the runtime's MCP tool host, wired over an
//! in-memory pipe.

use std::sync::{Arc, Mutex};

use reddit::api::{CommentForest, SearchQuery, Submission};
use reddit::{ContentApi, RedditError, RedditServer};
use rmcp::ServiceExt;
use runtime::{
    Backend, Error, McpClient, McpToolHost, Message, ModelError, ModelRequest, ModelResponse,
    Part, Role, Session, ToolCall, ToolError, ToolHost, Usage,
};
use serde_json::{Map, Value, json};

/// Serves one post, or fails every call with a rate-limit error.
struct StubApi {
    fail: bool,
}

impl ContentApi for StubApi {
    fn search(&self, _: &SearchQuery) -> reddit::Result<Vec<Submission>> {
        if self.fail {
            return Err(RedditError::RateLimited);
        }
        Ok(vec![Submission {
            id: "p1".into(),
            title: "Async traits are stable".into(),
            selftext: String::new(),
            url: "https://example.com/p1".into(),
            score: 12,
            num_comments: 3,
            created_utc: 0.0,
        }])
    }

    fn submission(&self, id: &str) -> reddit::Result<Submission> {
        Err(RedditError::NotFound(id.to_string()))
    }

    fn comments(&self, _: &str) -> reddit::Result<CommentForest> {
        Ok(CommentForest::default())
    }
}

async fn connect(fail: bool) -> McpToolHost {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    tokio::spawn(async move {
        let running = RedditServer::new(Arc::new(StubApi { fail }))
            .serve(server_io)
            .await
            .unwrap();
        let _ = running.waiting().await;
    });
    McpToolHost::new(McpClient::connect(client_io).await.unwrap())
}

fn search_args() -> Map<String, Value> {
    json!({"query": "async traits"}).as_object().unwrap().clone()
}

#[tokio::test]
async fn catalog_lists_three_tools() {
    let host = connect(false).await;
    let mut names: Vec<String> = host
        .list_tools()
        .await
        .unwrap()
        .into_iter()
        .map(|spec| spec.name)
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "get_submission_comments",
            "search_comments_in_posts",
            "search_posts"
        ]
    );
    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn successful_call_returns_json_content() {
    let host = connect(false).await;
    let output = host.call_tool("search_posts", search_args()).await.unwrap();

    let text = output[0]["text"].as_str().unwrap();
    let posts: Value = serde_json::from_str(text).unwrap();
    assert_eq!(posts[0]["id"], "p1");
    assert_eq!(posts[0]["score"], 12);
    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn failing_call_surfaces_as_execution_error() {
    let host = connect(true).await;
    let err = host
        .call_tool("search_posts", search_args())
        .await
        .unwrap_err();

    match err {
        ToolError::Execution(message) => assert!(message.contains("rate limited"), "{message}"),
        other => panic!("expected execution error, got {other:?}"),
    }
    host.shutdown().await.unwrap();
}

/// Requests `search_posts` once, then answers.
struct OneCallBackend {
    turns: Mutex<u32>,
}

impl Backend for OneCallBackend {
    async fn call(&self, _: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let mut turns = self.turns.lock().unwrap();
        *turns += 1;
        let part = if *turns == 1 {
            Part::ToolCall(ToolCall {
                id: "call_1".into(),
                name: "search_posts".into(),
                input: json!({"query": "async traits"}),
            })
        } else {
            Part::Text("done".into())
        };
        Ok(ModelResponse {
            message: Message {
                role: Role::Assistant,
                parts: vec![part],
            },
            usage: Usage::default(),
        })
    }
}

#[tokio::test]
async fn tool_failure_fails_the_query() {
    let backend = OneCallBackend {
        turns: Mutex::new(0),
    };
    let mut session = Session::new(backend, connect(true).await);

    let err = session.respond("what's new with async traits?").await.unwrap_err();
    assert!(matches!(err, Error::Tool(ToolError::Execution(_))), "{err:?}");

    session.into_tool_host().shutdown().await.unwrap();
}

#[tokio::test]
async fn tool_result_reaches_the_model() {
    let backend = OneCallBackend {
        turns: Mutex::new(0),
    };
    let mut session = Session::new(backend, connect(false).await);

    let answer = session.respond("what's new with async traits?").await.unwrap();
    assert_eq!(
        answer,
        "[Calling tool search_posts with args {'query': 'async traits'}]\ndone"
    );
    let results = session.messages()[2].tool_results();
    assert!(results[0].output_text().contains("Async traits are stable"));

    session.into_tool_host().shutdown().await.unwrap();
}
