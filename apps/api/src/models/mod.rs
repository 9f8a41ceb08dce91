pub mod interaction;
pub mod posting;
pub mod profile;

use serde::Deserialize;
use uuid::Uuid;

/// `?user_id=` on every per-user endpoint. There is no session layer.
#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}
