use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{stored_now, Testimonial, PLACEHOLDER_AVATAR};
use crate::store::{StoreError, TestimonialStore};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Debug, Error)]
pub enum TestimonialError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTestimonial {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rating: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Clone)]
pub struct Testimonials {
    store: Arc<dyn TestimonialStore>,
}

impl Testimonials {
    pub fn new(store: Arc<dyn TestimonialStore>) -> Self {
        Self { store }
    }

    pub async fn submit(&self, input: NewTestimonial) -> Result<Testimonial, TestimonialError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(validation("name", "Name is required"));
        }
        let text = input.text.trim().to_string();
        if text.is_empty() {
            return Err(validation("text", "Text is required"));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&input.rating) {
            return Err(validation("rating", "Rating must be between 1 and 5"));
        }
        let rating = u8::try_from(input.rating)
            .map_err(|_| validation("rating", "Rating must be between 1 and 5"))?;
        let image = input
            .image
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| PLACEHOLDER_AVATAR.to_string());

        let testimonial = Testimonial {
            id: Uuid::new_v4(),
            name,
            rating,
            text,
            image,
            created_at: stored_now(),
        };
        Ok(self.store.insert_testimonial(testimonial).await?)
    }

    pub async fn list_recent(&self) -> Result<Vec<Testimonial>, StoreError> {
        self.store.list_testimonials().await
    }
}

fn validation(field: &'static str, message: &str) -> TestimonialError {
    TestimonialError::Validation {
        field,
        message: message.to_string(),
    }
}
