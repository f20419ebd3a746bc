//! Notification endpoints

use reqwest::Method;

use super::client::Auth;
use super::responses::ListResponse;
use super::{ApiClient, ApiError};
use crate::models::{Notification, UserId};

impl ApiClient {
    /// GET /api/notifications/user/{userId} - A user's notifications
    pub async fn notifications_for_user(&self, user_id: &UserId) -> Result<Vec<Notification>, ApiError> {
        let notifications: ListResponse<Notification> = self
            .get_json(&format!("/api/notifications/user/{}", user_id))
            .await?;
        Ok(notifications.into_items())
    }

    /// GET /api/notifications/user/{userId}/unread-count - Unread badge count
    pub async fn unread_count(&self, user_id: &UserId) -> Result<u64, ApiError> {
        self.get_json(&format!("/api/notifications/user/{}/unread-count", user_id))
            .await
    }

    /// PUT /api/notifications/{id}/read - Mark one notification read
    pub async fn mark_notification_read(&self, id: i64) -> Result<(), ApiError> {
        let request = self.request(Method::PUT, &format!("/api/notifications/{}/read", id));
        self.send_text(request, Auth::Bearer).await?;
        Ok(())
    }

    /// PUT /api/notifications/user/{userId}/read-all - Mark everything read
    pub async fn mark_all_notifications_read(&self, user_id: &UserId) -> Result<(), ApiError> {
        let request = self.request(
            Method::PUT,
            &format!("/api/notifications/user/{}/read-all", user_id),
        );
        self.send_text(request, Auth::Bearer).await?;
        Ok(())
    }
}
