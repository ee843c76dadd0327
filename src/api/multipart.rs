// Form body parsing module
// Turns multipart/form-data and urlencoded bodies into a DocumentForm

use std::convert::Infallible;

use futures_util::stream;
use hyper::body::Bytes;
use serde::Deserialize;

use super::types::{DocumentForm, UploadedFile};

const FIELD_FILE: &str = "file";
const FIELD_NAME: &str = "name";
const FIELD_DESCRIPTION: &str = "description";

/// Extract the multipart boundary from a Content-Type header value.
///
/// Returns `None` when the content type is not multipart/form-data, in which
/// case the body should be treated as urlencoded.
pub fn boundary(content_type: &str) -> Option<String> {
    multer::parse_boundary(content_type).ok()
}

/// Parse a multipart/form-data body.
///
/// Recognizes the `file` part plus the `name` and `description` fields;
/// unknown parts are skipped. A file part without a file name counts as no
/// upload, matching how browsers submit an empty file input.
pub async fn parse_multipart(body: Bytes, boundary: String) -> Result<DocumentForm, multer::Error> {
    let body_stream = stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = multer::Multipart::new(body_stream, boundary);

    let mut form = DocumentForm::default();
    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some(FIELD_FILE) => {
                let file_name = field.file_name().map(str::to_owned);
                let data = field.bytes().await?;
                if let Some(file_name) = file_name.filter(|n| !n.is_empty()) {
                    form.file = Some(UploadedFile { file_name, data });
                }
            }
            Some(FIELD_NAME) => form.name = Some(field.text().await?),
            Some(FIELD_DESCRIPTION) => form.description = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(form)
}

/// Parse an application/x-www-form-urlencoded body (document update without
/// a new file).
pub fn parse_urlencoded(body: &[u8]) -> Result<DocumentForm, serde_urlencoded::de::Error> {
    #[derive(Debug, Deserialize, Default)]
    struct FormFields {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        description: Option<String>,
    }

    let fields: FormFields = serde_urlencoded::from_bytes(body)?;
    Ok(DocumentForm {
        name: fields.name,
        description: fields.description,
        file: None,
    })
}
