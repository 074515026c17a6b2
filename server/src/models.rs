use serde::{Deserialize, Serialize};

/// A persisted video. Created exactly once when an upload succeeds at the
/// provider and the row is written; never updated afterwards.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    // provider-assigned identifier, used to build retrieval/transformation URLs
    pub public_id: String,
    // byte counts kept as text, as supplied at ingestion time
    pub original_size: String,
    pub compressed_size: String,
    // seconds; zero when the provider reports none
    pub duration: f64,
    // durable provider-hosted retrieval URL
    pub url: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewVideoRecord {
    pub title: String,
    pub description: String,
    pub public_id: String,
    pub original_size: String,
    pub compressed_size: String,
    pub duration: f64,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResponse {
    pub public_id: String,
}
