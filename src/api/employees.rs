// Employee handlers module
// CRUD over the employee collection (JSON bodies, no file attachments)

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::response::{bad_request, internal_error, json_response, message_response, not_found};
use super::types::{Employee, EmployeeCreate, EmployeeUpdate};
use crate::config::AppState;
use crate::logger;
use crate::store::{next_id, StoreError};

const MSG_NOT_FOUND: &str = "Employee not found";
const MSG_DELETED: &str = "Employee deleted";
const MSG_FIELDS_REQUIRED: &str = "Name and Email are required";

const DEFAULT_STATUS: &str = "Active";
const DEFAULT_ACCESS: &str = "User";

/// GET /employees
pub fn list(state: &AppState) -> Response<Full<Bytes>> {
    match state.employees.load() {
        Ok(employees) => json_response(StatusCode::OK, &employees),
        Err(e) => storage_failure(&e),
    }
}

/// POST /employees
pub async fn create(
    req: Request<hyper::body::Incoming>,
    state: &AppState,
) -> Response<Full<Bytes>> {
    match read_json::<EmployeeCreate>(req).await {
        Ok(payload) => create_from_payload(state, payload).await,
        Err(response) => response,
    }
}

/// PUT /employees/{id}
pub async fn update(
    req: Request<hyper::body::Incoming>,
    state: &AppState,
    id: u64,
) -> Response<Full<Bytes>> {
    match read_json::<EmployeeUpdate>(req).await {
        Ok(payload) => update_from_payload(state, id, payload).await,
        Err(response) => response,
    }
}

/// DELETE /employees/{id}
pub async fn delete(state: &AppState, id: u64) -> Response<Full<Bytes>> {
    let result = state
        .employees
        .try_update(|employees| {
            let index = employees.iter().position(|e| e.id == id)?;
            employees.remove(index);
            Some(())
        })
        .await;

    match result {
        Ok(Some(())) => message_response(MSG_DELETED),
        Ok(None) => not_found(MSG_NOT_FOUND),
        Err(e) => storage_failure(&e),
    }
}

/// Apply a validated creation payload.
pub async fn create_from_payload(
    state: &AppState,
    payload: EmployeeCreate,
) -> Response<Full<Bytes>> {
    let name = payload.name.unwrap_or_default();
    let email = payload.email.unwrap_or_default();
    if name.is_empty() || email.is_empty() {
        return bad_request(MSG_FIELDS_REQUIRED);
    }

    let status = payload
        .status
        .unwrap_or_else(|| DEFAULT_STATUS.to_string());
    let access = payload
        .access
        .unwrap_or_else(|| DEFAULT_ACCESS.to_string());

    let result = state
        .employees
        .update(|employees| {
            let employee = Employee {
                id: next_id(employees),
                name: name.clone(),
                email: email.clone(),
                status,
                access,
            };
            employees.push(employee.clone());
            employee
        })
        .await;

    match result {
        Ok(employee) => json_response(StatusCode::CREATED, &employee),
        Err(e) => storage_failure(&e),
    }
}

/// Apply a partial update; absent fields keep their prior values.
pub async fn update_from_payload(
    state: &AppState,
    id: u64,
    payload: EmployeeUpdate,
) -> Response<Full<Bytes>> {
    let result = state
        .employees
        .try_update(|employees| {
            let employee = employees.iter_mut().find(|e| e.id == id)?;

            if let Some(name) = &payload.name {
                employee.name.clone_from(name);
            }
            if let Some(email) = &payload.email {
                employee.email.clone_from(email);
            }
            if let Some(status) = &payload.status {
                employee.status.clone_from(status);
            }
            if let Some(access) = &payload.access {
                employee.access.clone_from(access);
            }

            Some(employee.clone())
        })
        .await;

    match result {
        Ok(Some(employee)) => json_response(StatusCode::OK, &employee),
        Ok(None) => not_found(MSG_NOT_FOUND),
        Err(e) => storage_failure(&e),
    }
}

/// Collect the request body and parse it as JSON.
async fn read_json<T: DeserializeOwned>(
    req: Request<hyper::body::Incoming>,
) -> Result<T, Response<Full<Bytes>>> {
    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => return Err(bad_request("Failed to read request body")),
    };

    serde_json::from_slice(&body).map_err(|e| bad_request(&format!("Invalid JSON: {e}")))
}

fn storage_failure(err: &StoreError) -> Response<Full<Bytes>> {
    logger::log_error(&format!("Employee storage failure: {err}"));
    internal_error()
}
