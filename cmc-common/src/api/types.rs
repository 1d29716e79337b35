//! Shared API request/response types

use serde::{Deserialize, Serialize};

// ========================================
// Error Response Types
// ========================================

/// Error envelope returned by every failing endpoint
///
/// ```json
/// {"error": {"code": "NOT_FOUND", "message": "Department not found: ..."}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error identifier
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

// ========================================
// Listing Types
// ========================================

/// One page of a listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_shape() {
        let error = ErrorResponse::new("NOT_FOUND", "User not found: abc");
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert_eq!(json["error"]["message"], "User not found: abc");
    }

    #[test]
    fn test_paginated_serialization() {
        let page = Paginated {
            items: vec!["a", "b"],
            total: 27,
            page: 2,
            per_page: 25,
            total_pages: 2,
        };
        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(json["items"].as_array().unwrap().len(), 2);
        assert_eq!(json["total"], 27);
        assert_eq!(json["total_pages"], 2);
    }
}
