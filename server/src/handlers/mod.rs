use crate::state::AppState;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

pub mod images;
pub mod videos;

pub use images::image_upload_handler;
pub use videos::{list_videos_handler, video_upload_handler};

/// A fully buffered multipart upload form: at most one `file` part plus any
/// number of text fields.
pub struct UploadForm {
    pub file: Option<(String, Vec<u8>)>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn text_field(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }
}

// Read errors bubble up as-is; callers map them to their endpoint's
// generic upload failure.
pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, MultipartError> {
    let mut form = UploadForm {
        file: None,
        fields: HashMap::new(),
    };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let bytes = field.bytes().await?.to_vec();
            form.file = Some((filename, bytes));
        } else if !name.is_empty() {
            let value = field.text().await?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

/// Public, non-secret settings the client pages need at runtime.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub cloud_name: Option<String>,
    pub publishable_key: Option<String>,
}

pub async fn client_config_handler(State(state): State<Arc<AppState>>) -> Json<ClientConfig> {
    Json(ClientConfig {
        cloud_name: state
            .provider
            .as_ref()
            .map(|p| p.cloud_name().to_string()),
        publishable_key: state.auth.publishable_key.clone(),
    })
}
