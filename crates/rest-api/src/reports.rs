//! Read-only browsing of the report tree.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::{
    Json, Router,
    extract::{Path as UrlPath, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use common::{join_within, target_dir_name};

use crate::errors::{TargetAPIError, target_error};

#[derive(Clone)]
pub struct ReportsState {
    pub root: PathBuf,
}

pub fn router(state: ReportsState) -> Router {
    Router::new()
        .route("/reports", get(list_targets))
        .route("/reports/{target}", get(list_files))
        .route("/reports/{target}/{*file}", get(read_file))
        .with_state(state)
}

type ApiResult<T> = Result<T, (StatusCode, String)>;

async fn list_targets(State(st): State<ReportsState>) -> ApiResult<Json<Vec<String>>> {
    let mut out = Vec::new();
    let mut entries = match tokio::fs::read_dir(&st.root).await {
        Ok(rd) => rd,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Json(out)),
        Err(e) => return Err(target_error(TargetAPIError::Io(e))),
    };

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| target_error(TargetAPIError::Io(e)))?
    {
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        if is_dir {
            out.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    out.sort();
    Ok(Json(out))
}

fn target_dir(root: &Path, target: &str) -> Result<PathBuf, TargetAPIError> {
    join_within(root, &target_dir_name(target))
        .ok_or_else(|| TargetAPIError::BadPath(target.to_string()))
}

async fn list_files(
    State(st): State<ReportsState>,
    UrlPath(target): UrlPath<String>,
) -> ApiResult<Json<Vec<String>>> {
    let dir = target_dir(&st.root, &target).map_err(target_error)?;
    if !tokio::fs::metadata(&dir).await.is_ok_and(|m| m.is_dir()) {
        return Err(target_error(TargetAPIError::NotFound(format!(
            "reports for {target}"
        ))));
    }

    let mut files = Vec::new();
    let mut pending = vec![(dir, String::new())];
    while let Some((path, prefix)) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&path)
            .await
            .map_err(|e| target_error(TargetAPIError::Io(e)))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| target_error(TargetAPIError::Io(e)))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let rel = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            match entry.file_type().await {
                Ok(t) if t.is_dir() => pending.push((entry.path(), rel)),
                Ok(_) => {
                    // in-flight writes
                    if !rel.ends_with(".tmp") {
                        files.push(rel);
                    }
                }
                Err(_) => {}
            }
        }
    }
    files.sort();
    Ok(Json(files))
}

async fn read_file(
    State(st): State<ReportsState>,
    UrlPath((target, file)): UrlPath<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let dir = target_dir(&st.root, &target).map_err(target_error)?;
    let path = join_within(&dir, &file)
        .ok_or_else(|| target_error(TargetAPIError::BadPath(file.clone())))?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory) => {
            return Err(target_error(TargetAPIError::NotFound(format!(
                "{target}/{file}"
            ))));
        }
        Err(e) => return Err(target_error(TargetAPIError::Io(e))),
    };

    let content_type = if path.extension().is_some_and(|ext| ext == "json") {
        "application/json"
    } else {
        "application/octet-stream"
    };
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}
