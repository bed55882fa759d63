use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use shared::{
    domain::{EntityId, Post},
    protocol::{ApiResponse, ListResponse, Pagination},
};
use tokio::{net::TcpListener, sync::Mutex};

use crate::config::ClientSettings;

pub fn sample_post(n: usize) -> Post {
    let created: DateTime<Utc> = "2024-03-01T08:00:00Z".parse().expect("timestamp");
    let created = created + Duration::hours(n as i64);
    Post {
        id: EntityId(format!("p{n}")),
        title: format!("Lesson {n}"),
        body: format!("Notes for lesson number {n}"),
        author: "Prof. Ana".to_string(),
        subject: Some("Math".to_string()),
        tags: None,
        created_at: created,
        updated_at: created,
    }
}

pub fn sample_posts(count: usize) -> Vec<Post> {
    (1..=count).map(sample_post).collect()
}

pub fn settings_for(server_url: &str) -> ClientSettings {
    ClientSettings {
        api_url: server_url.to_string(),
        ..ClientSettings::default()
    }
}

/// Serves `app` on an ephemeral local port and returns its base url.
pub async fn serve(app: Router) -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

/// In-memory posts backend speaking the list/search/delete envelope.
#[derive(Clone)]
pub struct MockBackend {
    pub posts: Arc<Mutex<Vec<Post>>>,
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }

    async fn record(&self, method: &str, uri: &Uri) {
        self.requests.lock().await.push(format!("{method} {uri}"));
    }
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<u32>,
    limit: Option<u32>,
    q: Option<String>,
    author: Option<String>,
}

fn paginate(posts: &[Post], page: u32, limit: u32) -> ListResponse<Post> {
    let page = page.max(1);
    let limit = limit.max(1);
    let pagination = Pagination::for_count(page, posts.len() as u64, limit);
    let data = posts
        .iter()
        .skip(((page - 1) * limit) as usize)
        .take(limit as usize)
        .cloned()
        .collect();
    ListResponse::page(
        data,
        Pagination {
            current_page: page,
            ..pagination
        },
    )
}

async fn list_posts(
    State(backend): State<MockBackend>,
    uri: Uri,
    Query(q): Query<PageQuery>,
) -> Json<ListResponse<Post>> {
    backend.record("GET", &uri).await;
    let posts = backend.posts.lock().await;
    let filtered: Vec<Post> = posts
        .iter()
        .filter(|post| q.author.as_deref().map_or(true, |a| post.author == a))
        .cloned()
        .collect();
    Json(paginate(
        &filtered,
        q.page.unwrap_or(1),
        q.limit.unwrap_or(10),
    ))
}

async fn search_posts(
    State(backend): State<MockBackend>,
    uri: Uri,
    Query(q): Query<PageQuery>,
) -> Json<ListResponse<Post>> {
    backend.record("GET", &uri).await;
    let term = q.q.clone().unwrap_or_default().to_lowercase();
    let posts = backend.posts.lock().await;
    let matching: Vec<Post> = posts
        .iter()
        .filter(|post| {
            post.title.to_lowercase().contains(&term) || post.body.to_lowercase().contains(&term)
        })
        .cloned()
        .collect();
    let mut response = paginate(&matching, q.page.unwrap_or(1), q.limit.unwrap_or(10));
    response.search_term = q.q;
    Json(response)
}

async fn delete_post(
    State(backend): State<MockBackend>,
    uri: Uri,
    Path(id): Path<String>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    backend.record("DELETE", &uri).await;
    let mut posts = backend.posts.lock().await;
    let before = posts.len();
    posts.retain(|post| post.id.as_str() != id);
    if posts.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::failure("Post not found")),
        );
    }
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            message: Some("Post deleted".to_string()),
            data: None,
            errors: Vec::new(),
        }),
    )
}

pub async fn spawn_backend(posts: Vec<Post>) -> Result<(String, MockBackend)> {
    let backend = MockBackend {
        posts: Arc::new(Mutex::new(posts)),
        requests: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/search", get(search_posts))
        .route("/posts/:id", axum::routing::delete(delete_post))
        .with_state(backend.clone());
    let url = serve(app).await?;
    Ok((url, backend))
}
