//! Reusable OpenAPI response types for consistent API documentation.

use super::ErrorResponse;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Validation Error",
    content_type = "application/json",
    example = json!({
        "success": false,
        "code": "VALIDATION_ERROR",
        "error": "Request validation failed",
        "details": {
            "documents": [{
                "code": "documents_required",
                "message": "documents array is required",
                "params": {}
            }]
        }
    })
)]
pub struct BadRequestValidationResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Vector store failure",
    content_type = "application/json",
    example = json!({
        "success": false,
        "code": "VECTOR_STORE_ERROR",
        "error": "Failed to add documents",
        "details": "error sending request for url (http://localhost:8000/api/v2/heartbeat)"
    })
)]
pub struct StoreErrorResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Resource not found",
    content_type = "application/json",
    example = json!({
        "success": false,
        "code": "NOT_FOUND",
        "error": "Resource not found"
    })
)]
pub struct NotFoundResponse(pub ErrorResponse);
