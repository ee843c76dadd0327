// Document handlers module
// CRUD over the document collection plus upload storage on local disk

use std::path::Path;
use std::{fs, io};

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};

use super::multipart;
use super::response::{bad_request, internal_error, json_response, message_response, not_found};
use super::types::{Document, DocumentForm, UploadedFile};
use crate::config::{AppState, StorageConfig};
use crate::logger;
use crate::store::{next_id, StoreError};

const MSG_NOT_FOUND: &str = "Document not found";
const MSG_DELETED: &str = "Document deleted";
const MSG_NO_FILE: &str = "No file uploaded";
const MSG_FIELDS_REQUIRED: &str = "Name and Description are required";

const STATUS_ACTIVE: &str = "Active";

/// GET /documents
pub fn list(state: &AppState) -> Response<Full<Bytes>> {
    match state.documents.load() {
        Ok(documents) => json_response(StatusCode::OK, &documents),
        Err(e) => storage_failure(&e),
    }
}

/// POST /documents
pub async fn create(
    req: Request<hyper::body::Incoming>,
    state: &AppState,
) -> Response<Full<Bytes>> {
    match read_form(req).await {
        Ok(form) => create_from_form(state, form).await,
        Err(response) => response,
    }
}

/// PUT /documents/{id}
pub async fn update(
    req: Request<hyper::body::Incoming>,
    state: &AppState,
    id: u64,
) -> Response<Full<Bytes>> {
    match read_form(req).await {
        Ok(form) => update_from_form(state, id, form).await,
        Err(response) => response,
    }
}

/// DELETE /documents/{id}
pub async fn delete(state: &AppState, id: u64) -> Response<Full<Bytes>> {
    let result = state
        .documents
        .try_update(|documents| {
            let index = documents.iter().position(|d| d.id == id)?;
            Some(documents.remove(index))
        })
        .await;

    match result {
        Ok(Some(removed)) => {
            // The record is gone; its stored file must not leak
            remove_stored_file(&state.config.storage, &removed.file_url);
            message_response(MSG_DELETED)
        }
        Ok(None) => not_found(MSG_NOT_FOUND),
        Err(e) => storage_failure(&e),
    }
}

/// Apply a parsed creation form: store the upload, append the record.
pub async fn create_from_form(state: &AppState, form: DocumentForm) -> Response<Full<Bytes>> {
    let Some(file) = form.file else {
        return bad_request(MSG_NO_FILE);
    };

    let name = form.name.unwrap_or_default();
    let description = form.description.unwrap_or_default();
    if name.is_empty() || description.is_empty() {
        return bad_request(MSG_FIELDS_REQUIRED);
    }

    let stored = match store_upload(&state.config.storage, &file) {
        Ok(stored) => stored,
        Err(response) => return response,
    };

    let result = state
        .documents
        .update(|documents| {
            let document = Document {
                id: next_id(documents),
                name: name.clone(),
                description: description.clone(),
                file_url: stored.url.clone(),
                size: stored.size.clone(),
                status: STATUS_ACTIVE.to_string(),
            };
            documents.push(document.clone());
            document
        })
        .await;

    match result {
        Ok(document) => json_response(StatusCode::CREATED, &document),
        Err(e) => storage_failure(&e),
    }
}

/// Apply a parsed update form: replace present fields, swap the stored file
/// when a new one was uploaded.
pub async fn update_from_form(
    state: &AppState,
    id: u64,
    form: DocumentForm,
) -> Response<Full<Bytes>> {
    let mut upload_failure = None;

    let result = state
        .documents
        .try_update(|documents| {
            let document = documents.iter_mut().find(|d| d.id == id)?;

            if let Some(name) = &form.name {
                document.name.clone_from(name);
            }
            if let Some(description) = &form.description {
                document.description.clone_from(description);
            }

            // The upload is stored only after the id matched, so a 404 never
            // touches the upload directory
            if let Some(file) = &form.file {
                match store_upload(&state.config.storage, file) {
                    Ok(stored) => {
                        if document.file_url != stored.url {
                            remove_stored_file(&state.config.storage, &document.file_url);
                        }
                        document.file_url = stored.url;
                        document.size = stored.size;
                    }
                    Err(response) => {
                        upload_failure = Some(response);
                        return None;
                    }
                }
            }

            Some(document.clone())
        })
        .await;

    if let Some(response) = upload_failure {
        return response;
    }

    match result {
        Ok(Some(document)) => json_response(StatusCode::OK, &document),
        Ok(None) => not_found(MSG_NOT_FOUND),
        Err(e) => storage_failure(&e),
    }
}

/// Collect the request body and parse it as multipart or urlencoded.
async fn read_form(
    req: Request<hyper::body::Incoming>,
) -> Result<DocumentForm, Response<Full<Bytes>>> {
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();

    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => return Err(bad_request("Failed to read request body")),
    };

    if let Some(boundary) = multipart::boundary(&content_type) {
        multipart::parse_multipart(body, boundary)
            .await
            .map_err(|e| bad_request(&format!("Invalid multipart body: {e}")))
    } else {
        multipart::parse_urlencoded(&body)
            .map_err(|e| bad_request(&format!("Invalid form body: {e}")))
    }
}

struct StoredUpload {
    url: String,
    size: String,
}

/// Persist an upload under its client-supplied file name.
///
/// The name is reduced to its final path component before joining, so a
/// crafted name cannot escape the upload directory. Name collisions
/// overwrite: last write wins.
fn store_upload(
    storage: &StorageConfig,
    upload: &UploadedFile,
) -> Result<StoredUpload, Response<Full<Bytes>>> {
    let Some(file_name) = stored_file_name(&upload.file_name) else {
        return Err(bad_request("Invalid file name"));
    };

    let path = storage.uploads_path().join(&file_name);
    if let Err(e) = fs::write(&path, &upload.data) {
        logger::log_error(&format!("Failed to store upload {}: {e}", path.display()));
        return Err(internal_error());
    }

    Ok(StoredUpload {
        url: storage.upload_url(&file_name),
        size: format_size(upload.data.len() as u64),
    })
}

/// Reduce a client-supplied file name to its final path component.
fn stored_file_name(raw: &str) -> Option<String> {
    Path::new(raw)
        .file_name()
        .and_then(|n| n.to_str())
        .map(ToOwned::to_owned)
}

/// Best-effort removal of a previously stored upload.
fn remove_stored_file(storage: &StorageConfig, file_url: &str) {
    let Some(file_name) = file_url.rsplit('/').next().filter(|n| !n.is_empty()) else {
        return;
    };

    let path = storage.uploads_path().join(file_name);
    if let Err(e) = fs::remove_file(&path) {
        if e.kind() != io::ErrorKind::NotFound {
            logger::log_warning(&format!(
                "Failed to remove stored file {}: {e}",
                path.display()
            ));
        }
    }
}

/// Human-readable size: KiB with two decimals.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

fn storage_failure(err: &StoreError) -> Response<Full<Bytes>> {
    logger::log_error(&format!("Document storage failure: {err}"));
    internal_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::response::test_util::body_json;
    use crate::config::{Config, HttpConfig, LoggingConfig, ServerConfig, StorageConfig};
    use tempfile::TempDir;

    fn test_state(dir: &TempDir) -> AppState {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                workers: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: false,
                access_log_format: "combined".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            http: HttpConfig {
                enable_cors: true,
                max_body_size: 1_048_576,
                keep_alive_timeout: 75,
                read_timeout: 30,
                write_timeout: 30,
                max_connections: None,
            },
            storage: StorageConfig {
                data_dir: dir.path().to_string_lossy().into_owned(),
                upload_dir: "uploads".to_string(),
                documents_file: "documents.json".to_string(),
                employees_file: "employees.json".to_string(),
            },
        };
        AppState::new(config).expect("state")
    }

    fn form(name: Option<&str>, description: Option<&str>, file: Option<(&str, &[u8])>) -> DocumentForm {
        DocumentForm {
            name: name.map(ToOwned::to_owned),
            description: description.map(ToOwned::to_owned),
            file: file.map(|(file_name, data)| UploadedFile {
                file_name: file_name.to_owned(),
                data: Bytes::copy_from_slice(data),
            }),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_size_and_status() {
        let dir = TempDir::new().expect("tempdir");
        let state = test_state(&dir);

        let response = create_from_form(
            &state,
            form(Some("Report"), Some("Q3 numbers"), Some(("q3.bin", &[0u8; 2048]))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["id"], 1);
        assert_eq!(body["name"], "Report");
        assert_eq!(body["description"], "Q3 numbers");
        assert_eq!(body["fileUrl"], "/uploads/q3.bin");
        assert_eq!(body["size"], "2.00 KB");
        assert_eq!(body["status"], "Active");

        // The raw upload landed on disk under its original name
        assert!(dir.path().join("uploads/q3.bin").exists());

        let second = create_from_form(
            &state,
            form(Some("Second"), Some("More"), Some(("two.bin", &[1u8; 1536]))),
        )
        .await;
        let body = body_json(second).await;
        assert_eq!(body["id"], 2);
        assert_eq!(body["size"], "1.50 KB");
    }

    #[tokio::test]
    async fn test_create_without_file_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let state = test_state(&dir);

        let response = create_from_form(&state, form(Some("Report"), Some("desc"), None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "No file uploaded");

        assert!(state.documents.load().expect("load").is_empty());
    }

    #[tokio::test]
    async fn test_create_with_empty_fields_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let state = test_state(&dir);

        for (name, description) in [(None, Some("desc")), (Some("Report"), None), (Some(""), Some("desc"))] {
            let response =
                create_from_form(&state, form(name, description, Some(("f.bin", b"data")))).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = body_json(response).await;
            assert_eq!(body["error"], "Name and Description are required");
        }

        assert!(state.documents.load().expect("load").is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_only_present_fields() {
        let dir = TempDir::new().expect("tempdir");
        let state = test_state(&dir);

        create_from_form(
            &state,
            form(Some("Report"), Some("Old"), Some(("q3.bin", &[0u8; 1024]))),
        )
        .await;

        let response =
            update_from_form(&state, 1, form(None, Some("New description"), None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["name"], "Report");
        assert_eq!(body["description"], "New description");
        assert_eq!(body["fileUrl"], "/uploads/q3.bin");
        assert_eq!(body["size"], "1.00 KB");
    }

    #[tokio::test]
    async fn test_update_with_new_file_recomputes_and_replaces() {
        let dir = TempDir::new().expect("tempdir");
        let state = test_state(&dir);

        create_from_form(
            &state,
            form(Some("Report"), Some("desc"), Some(("old.bin", &[0u8; 1024]))),
        )
        .await;
        assert!(dir.path().join("uploads/old.bin").exists());

        let response =
            update_from_form(&state, 1, form(None, None, Some(("new.bin", &[0u8; 512])))).await;
        let body = body_json(response).await;
        assert_eq!(body["fileUrl"], "/uploads/new.bin");
        assert_eq!(body["size"], "0.50 KB");

        // The superseded upload is gone, the new one is present
        assert!(!dir.path().join("uploads/old.bin").exists());
        assert!(dir.path().join("uploads/new.bin").exists());
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let state = test_state(&dir);

        let response = update_from_form(&state, 42, form(Some("x"), None, None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Document not found");
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_file() {
        let dir = TempDir::new().expect("tempdir");
        let state = test_state(&dir);

        create_from_form(
            &state,
            form(Some("Report"), Some("desc"), Some(("gone.bin", b"data"))),
        )
        .await;
        assert!(dir.path().join("uploads/gone.bin").exists());

        let response = delete(&state, 1).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Document deleted");

        assert!(state.documents.load().expect("load").is_empty());
        assert!(!dir.path().join("uploads/gone.bin").exists());
    }

    #[tokio::test]
    async fn test_delete_unknown_id_leaves_collection_unchanged() {
        let dir = TempDir::new().expect("tempdir");
        let state = test_state(&dir);

        create_from_form(
            &state,
            form(Some("Report"), Some("desc"), Some(("keep.bin", b"data"))),
        )
        .await;

        let response = delete(&state, 99).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(state.documents.load().expect("load").len(), 1);
    }

    #[tokio::test]
    async fn test_ids_do_not_collide_after_deletion() {
        let dir = TempDir::new().expect("tempdir");
        let state = test_state(&dir);

        for i in 0..3 {
            create_from_form(
                &state,
                form(Some("Doc"), Some("desc"), Some((&format!("f{i}.bin"), b"x"))),
            )
            .await;
        }
        delete(&state, 2).await;

        let response = create_from_form(
            &state,
            form(Some("Doc"), Some("desc"), Some(("f3.bin", b"x"))),
        )
        .await;
        let body = body_json(response).await;
        assert_eq!(body["id"], 4);

        let documents = state.documents.load().expect("load");
        let mut ids: Vec<u64> = documents.iter().map(|d| d.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), documents.len());
    }

    #[test]
    fn test_stored_file_name_strips_directories() {
        assert_eq!(stored_file_name("report.pdf").as_deref(), Some("report.pdf"));
        assert_eq!(stored_file_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(stored_file_name("dir/inner.txt").as_deref(), Some("inner.txt"));
        assert!(stored_file_name("..").is_none());
        assert!(stored_file_name("").is_none());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(0), "0.00 KB");
        assert_eq!(format_size(100), "0.10 KB");
    }
}
