use serde::Serialize;
pub(crate) mod health_check_controller;
pub(crate) mod job_controller;
pub(crate) mod job_stream_controller;
pub(crate) mod log_stream_controller;
pub(crate) mod stream_status_controller;

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status_code: u16, data: T) -> Self {
        Self {
            status_code,
            data: Some(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_serialize_api_response_with_data() {
        let response = ApiResponse::new(StatusCode::CREATED.into(), json!({"name": "build"}));
        let serialized = serde_json::to_value(&response).unwrap();

        assert_eq!(
            serialized,
            json!({"status_code": 201, "data": {"name": "build"}})
        );
    }

    #[test]
    fn test_serialize_api_response_without_data() {
        let response = ApiResponse::<()> {
            status_code: StatusCode::NO_CONTENT.into(),
            data: None,
        };
        let serialized = serde_json::to_string(&response).unwrap();
        assert_eq!(serialized, json!({"status_code": 204}).to_string());
    }
}
