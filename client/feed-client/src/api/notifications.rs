//! GET /api/notifications

use super::ApiClient;
use crate::error::Result;
use crate::models::wire::RawNotification;

impl ApiClient {
    pub async fn list_notifications(&self) -> Result<Vec<RawNotification>> {
        self.send_json(self.get("/api/notifications"), "list_notifications")
            .await
    }
}
