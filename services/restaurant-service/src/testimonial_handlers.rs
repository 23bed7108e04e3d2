use axum::{extract::State, http::StatusCode, Json};
use common_http_errors::{ApiError, ApiJson, ApiResult};

use crate::models::Testimonial;
use crate::testimonials::{NewTestimonial, TestimonialError};
use crate::AppState;

impl From<TestimonialError> for ApiError {
    fn from(err: TestimonialError) -> Self {
        match err {
            TestimonialError::Validation { field, message } => ApiError::validation(field, message),
            TestimonialError::Store(err) => ApiError::internal(err),
        }
    }
}

pub async fn create_testimonial(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewTestimonial>,
) -> ApiResult<(StatusCode, Json<Testimonial>)> {
    let testimonial = state.testimonials.submit(input).await?;
    Ok((StatusCode::CREATED, Json(testimonial)))
}

pub async fn list_testimonials(State(state): State<AppState>) -> ApiResult<Json<Vec<Testimonial>>> {
    let testimonials = state
        .testimonials
        .list_recent()
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(testimonials))
}
