// API types module
// Record shapes and request payloads for the CRUD surface

use hyper::body::Bytes;
use serde::{Deserialize, Serialize};

use crate::store::Record;

/// A document record with its uploaded file metadata.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: u64,
    pub name: String,
    pub description: String,
    /// Public path of the stored upload, e.g. `/uploads/report.pdf`
    #[serde(rename = "fileUrl")]
    pub file_url: String,
    /// Human-readable size, e.g. `"2.00 KB"`
    pub size: String,
    pub status: String,
}

impl Record for Document {
    fn id(&self) -> u64 {
        self.id
    }
}

/// An employee record.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub status: String,
    pub access: String,
}

impl Record for Employee {
    fn id(&self) -> u64 {
        self.id
    }
}

/// JSON body for `POST /employees`
///
/// All fields optional at the serde level; the handler enforces presence of
/// `name` and `email` so it can answer with the validation message instead
/// of a deserialization error.
#[derive(Debug, Deserialize, Default)]
pub struct EmployeeCreate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub access: Option<String>,
}

/// JSON body for `PUT /employees/{id}`; absent fields keep prior values
#[derive(Debug, Deserialize, Default)]
pub struct EmployeeUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub access: Option<String>,
}

/// Parsed multipart or urlencoded body for document create/update
#[derive(Debug, Default)]
pub struct DocumentForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub file: Option<UploadedFile>,
}

/// One uploaded file part
#[derive(Debug)]
pub struct UploadedFile {
    /// Client-supplied file name
    pub file_name: String,
    pub data: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_serializes_file_url_in_camel_case() {
        let document = Document {
            id: 1,
            name: "Quarterly report".to_string(),
            description: "Q3 numbers".to_string(),
            file_url: "/uploads/q3.pdf".to_string(),
            size: "12.40 KB".to_string(),
            status: "Active".to_string(),
        };

        let json = serde_json::to_value(&document).expect("serialize");
        assert_eq!(json["fileUrl"], "/uploads/q3.pdf");
        assert!(json.get("file_url").is_none());
    }

    #[test]
    fn test_employee_create_tolerates_missing_fields() {
        let payload: EmployeeCreate = serde_json::from_str(r#"{"name":"Ada"}"#).expect("parse");
        assert_eq!(payload.name.as_deref(), Some("Ada"));
        assert!(payload.email.is_none());
        assert!(payload.status.is_none());
        assert!(payload.access.is_none());
    }

    #[test]
    fn test_employee_round_trip() {
        let employee = Employee {
            id: 7,
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            status: "Active".to_string(),
            access: "Admin".to_string(),
        };

        let json = serde_json::to_string(&employee).expect("serialize");
        let back: Employee = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, employee);
    }
}
