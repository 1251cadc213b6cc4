use serde::Serialize;

use crate::entities::movie;

pub const POSTER_URL_PREFIX: &str = "/api/v1/posters";

#[derive(Clone, Debug, Serialize)]
pub struct ErrorList {
    pub errors: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct IndexMessage {
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieCreated {
    pub message: String,
    pub title: String,
    pub poster: String,
    pub description: String,
}

impl From<&movie::Model> for MovieCreated {
    fn from(m: &movie::Model) -> Self {
        Self {
            message: "Movie Successfully Added".to_string(),
            title: m.title.clone(),
            poster: m.poster.clone(),
            description: m.description.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieSummary {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub poster: String,
}

impl From<movie::Model> for MovieSummary {
    fn from(m: movie::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            poster: poster_url(&m.poster),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieList {
    pub movies: Vec<MovieSummary>,
}

pub fn poster_url(filename: &str) -> String {
    format!("{POSTER_URL_PREFIX}/{filename}")
}
