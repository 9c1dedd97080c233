use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use crate::db::{Article, ArticleFilter, Database};

const ARTICLES_PER_PAGE: i64 = 12;

pub struct AppState {
    pub db: Arc<Database>,
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub articles: Vec<Article>,
    pub categories: Vec<String>,
    pub search: String,
    pub category: String,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

#[derive(Template)]
#[template(path = "article.html")]
pub struct ArticleTemplate {
    pub article: Article,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

// Custom error type
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error: {}", self.0),
        )
            .into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

fn page_href(search: &str, category: &str, page: i64) -> String {
    format!(
        "/?search={}&category={}&page={}",
        urlencoding::encode(search),
        urlencoding::encode(category),
        page
    )
}

// Route handlers
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let search = query.search.trim().to_string();
    let category = query.category.trim().to_string();
    let page = query.page.max(1);
    let offset = (page - 1) * ARTICLES_PER_PAGE;

    let filter = ArticleFilter {
        search: Some(search.clone()).filter(|s| !s.is_empty()),
        category: Some(category.clone()).filter(|c| !c.is_empty()),
    };

    let (articles, total) = state
        .db
        .query_articles(&filter, ARTICLES_PER_PAGE, offset)
        .await?;
    let categories = state.db.list_categories().await?;
    let pages = (total + ARTICLES_PER_PAGE - 1) / ARTICLES_PER_PAGE;
    let pages = pages.max(1);

    let prev_href = (page > 1).then(|| page_href(&search, &category, page - 1));
    let next_href = (page < pages).then(|| page_href(&search, &category, page + 1));

    Ok(HtmlTemplate(IndexTemplate {
        articles,
        categories,
        search,
        category,
        total,
        page,
        pages,
        prev_href,
        next_href,
    }))
}

pub async fn article_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let Some(article) = state.db.get_article(id).await? else {
        return Ok((StatusCode::NOT_FOUND, "Article not found").into_response());
    };

    Ok(HtmlTemplate(ArticleTemplate { article }).into_response())
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
