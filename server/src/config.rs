use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct AppConfig {
    pub db_path: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    // directory of static client pages, served as the router fallback
    pub client_dist_dir: Option<String>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub cors_allow_credentials: Option<bool>,
    // media provider credentials; uploads fail without them
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
    // identity provider keys; the secret verifies session tokens
    pub auth_publishable_key: Option<String>,
    pub auth_secret_key: String,
}
