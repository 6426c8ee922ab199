use serde::Serialize;

use crate::users::Pagination;

/// `{success, message?, token?, data?, pagination?}` envelope used by every endpoint.
#[derive(Debug, Serialize)]
pub struct JsonResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> JsonResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            token: None,
            data: Some(data),
            pagination: None,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    pub fn paginated(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl JsonResponse<()> {
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            token: None,
            data: None,
            pagination: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_parts_are_omitted() {
        let json = serde_json::to_value(JsonResponse::message_only("User deleted successfully")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": true, "message": "User deleted successfully"})
        );
    }

    #[test]
    fn list_envelope_has_pagination() {
        let json = serde_json::to_value(
            JsonResponse::ok(vec![1, 2]).paginated(Pagination::new(1, 10, 2)),
        )
        .unwrap();
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(json["pagination"]["pages"], 1);
        assert!(json.get("token").is_none());
    }
}
