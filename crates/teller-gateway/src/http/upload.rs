//! Multipart form reading shared by the audio endpoints.

use axum::extract::Multipart;

use teller_voice::TranscribeRequest;

use crate::error::ApiError;

pub(crate) struct Upload {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl Upload {
    pub fn into_request(self) -> TranscribeRequest {
        TranscribeRequest::new(
            self.bytes,
            self.filename.unwrap_or_default(),
            self.content_type,
        )
    }
}

/// The `file` part and an optional `text` part; other parts are ignored.
#[derive(Default)]
pub(crate) struct Form {
    pub text: Option<String>,
    pub file: Option<Upload>,
}

pub(crate) async fn read_form(mut multipart: Multipart) -> Result<Form, ApiError> {
    let mut form = Form::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                form.file = Some(Upload {
                    bytes: bytes.to_vec(),
                    filename,
                    content_type,
                });
            }
            "text" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                form.text = Some(text.trim().to_string()).filter(|t| !t.is_empty());
            }
            _ => {}
        }
    }

    Ok(form)
}
