//! Success envelope shared by every endpoint.

use serde::Serialize;
use serde_json::Value;

pub const LISTED: &str = "Documents received successfully";
pub const FOUND: &str = "Document found";
pub const CREATED: &str = "Document created successfully";
pub const UPDATED: &str = "Document updated successfully";

/// `{ "message": "...", "results": n, "data": ... }`. `results` is only
/// present on list responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(message: &'static str, data: T) -> Self {
        Self {
            message,
            results: None,
            data,
        }
    }
}

impl ApiResponse<Vec<Value>> {
    pub fn list(items: Vec<Value>) -> Self {
        Self::listed(LISTED, items)
    }

    pub fn listed(message: &'static str, items: Vec<Value>) -> Self {
        Self {
            message,
            results: Some(items.len()),
            data: items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_results_only_on_lists() {
        let single = serde_json::to_value(ApiResponse::new(FOUND, json!({ "id": 1 }))).unwrap();
        assert!(single.get("results").is_none());

        let list = serde_json::to_value(ApiResponse::list(vec![json!(1), json!(2)])).unwrap();
        assert_eq!(list["results"], 2);
        assert_eq!(list["message"], LISTED);
    }
}
