use crate::auth::AuthKeys;
use crate::cloudinary::CloudinaryClient;
use sqlx::SqlitePool;

// stateless connection handles only; nothing here is mutated across requests
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub provider: Option<CloudinaryClient>,
    pub auth: AuthKeys,
}
