use std::{path::PathBuf, sync::Arc};

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, Request, State, multipart::MultipartRejection,
    },
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tower::ServiceExt;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeFile,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::{
    AppState,
    csrf::HEADER_NAMES,
    error::{AppError, AppResult},
    forms::{self, MovieForm, UploadedFile},
    models::{CsrfTokenResponse, IndexMessage, MovieCreated, MovieList, MovieSummary},
    upload,
};

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/api/v1/movies", get(list_movies).post(create_movie))
        .route("/api/v1/posters/{filename}", get(get_poster))
        .route("/api/v1/csrf-token", get(csrf_token))
        .route("/{file_name}", get(static_text).fallback(not_found))
        .fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-ua-compatible"),
            HeaderValue::from_static("IE=Edge,chrome=1"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=0"),
        ))
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

pub async fn index() -> Json<IndexMessage> {
    Json(IndexMessage { message: "This is the beginning of our API".to_string() })
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<MovieCreated>)> {
    let mut multipart = multipart?;
    let mut form = MovieForm::default();
    let mut form_token = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = Some(field.text().await?),
            "description" => form.description = Some(field.text().await?),
            "poster" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                form.poster = Some(UploadedFile { filename, data });
            }
            "csrf_token" => form_token = Some(field.text().await?),
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    if state.config.csrf_enabled {
        let token = header_token(&headers).or(form_token);
        if let Err(e) = state.csrf.verify(token.as_deref()) {
            tracing::debug!(error = %e, "csrf check failed");
            return Err(AppError::Validation(vec![forms::field_message(
                forms::CSRF_TOKEN,
                &e.to_string(),
            )]));
        }
    }

    let valid = form.validate(&state.rules).map_err(|errors| {
        tracing::debug!(fields = ?errors.field_names(), "movie form rejected");
        AppError::Validation(errors.messages())
    })?;

    state.posters.save(&valid.poster_filename, &valid.poster_data).await?;

    let movie = match state
        .store
        .insert(&valid.title, &valid.description, &valid.poster_filename)
        .await
    {
        Ok(movie) => movie,
        Err(e) => {
            state.posters.remove(&valid.poster_filename).await;
            return Err(e);
        }
    };

    Ok((StatusCode::CREATED, Json(MovieCreated::from(&movie))))
}

pub async fn list_movies(State(state): State<Arc<AppState>>) -> AppResult<Json<MovieList>> {
    let movies = state.store.list_all().await?.into_iter().map(MovieSummary::from).collect();
    Ok(Json(MovieList { movies }))
}

pub async fn get_poster(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    req: Request,
) -> AppResult<Response> {
    let path = state.posters.resolve(&filename).await?;
    Ok(serve_file(path, req).await)
}

pub async fn csrf_token(State(state): State<Arc<AppState>>) -> Json<CsrfTokenResponse> {
    Json(CsrfTokenResponse { csrf_token: state.csrf.generate() })
}

pub async fn static_text(
    State(state): State<Arc<AppState>>,
    Path(file_name): Path<String>,
    req: Request,
) -> AppResult<Response> {
    if !file_name.ends_with(".txt") {
        return Err(AppError::not_found());
    }
    let path = upload::resolve_in(&state.config.static_folder, &file_name).await?;
    Ok(serve_file(path, req).await)
}

pub async fn not_found() -> AppError {
    AppError::not_found()
}

fn header_token(headers: &HeaderMap) -> Option<String> {
    HEADER_NAMES
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn serve_file(path: PathBuf, req: Request) -> Response {
    match ServeFile::new(path).oneshot(req).await {
        Ok(res) => res.into_response(),
        Err(never) => match never {},
    }
}
