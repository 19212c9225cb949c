//! Input validation for forms, run before any request is sent.
//!
//! Single-field checks return `Result<(), String>`; the `validate_*_draft`
//! functions collect them with [`ValidationErrorBuilder`] so a form can show
//! every problem at once.

use lazy_static::lazy_static;
use regex::Regex;

use super::{ValidationError, ValidationErrorBuilder};
use crate::models::{FacilityDraft, LoginRequest, PackageDraft, ReviewDraft, RoomDraft};

lazy_static! {
    /// Loose email shape check; the server is authoritative
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[^\s@]+@[^\s@]+\.[^\s@]+$"
    ).unwrap();
}

/// Validate a required, trimmed, length-bounded text field
pub fn validate_required(value: &str, label: &str, max_len: usize) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} is required", label));
    }
    if trimmed.chars().count() > max_len {
        return Err(format!("{} is too long (max {} characters)", label, max_len));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }
    if !EMAIL_REGEX.is_match(email.trim()) {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

pub fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() || price <= 0.0 {
        return Err("Price must be greater than 0".to_string());
    }
    Ok(())
}

pub fn validate_duration_days(days: u32) -> Result<(), String> {
    if days == 0 {
        return Err("Duration must be at least 1 day".to_string());
    }
    if days > 3650 {
        return Err("Duration is too long (max 3650 days)".to_string());
    }
    Ok(())
}

pub fn validate_rating(rating: u8) -> Result<(), String> {
    if !(1..=5).contains(&rating) {
        return Err("Rating must be between 1 and 5".to_string());
    }
    Ok(())
}

/// Validate a positive count (optional field)
pub fn validate_positive(value: Option<u32>, label: &str) -> Result<(), String> {
    match value {
        Some(0) => Err(format!("{} must be greater than 0", label)),
        _ => Ok(()),
    }
}

pub fn validate_login(request: &LoginRequest) -> Result<(), ValidationError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("email", validate_email(&request.email));
    if request.password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.finish()
}

pub fn validate_package_draft(draft: &PackageDraft) -> Result<(), ValidationError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("name", validate_required(&draft.name, "Name", 100))
        .check("price", validate_price(draft.price))
        .check("durationInDays", validate_duration_days(draft.duration_in_days))
        .check("category", validate_required(&draft.category, "Category", 50));
    if draft.features.iter().any(|f| f.trim().is_empty()) {
        errors.add("features", "Features cannot be empty");
    }
    errors.finish()
}

pub fn validate_room_draft(draft: &RoomDraft) -> Result<(), ValidationError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("name", validate_required(&draft.name, "Room name", 100))
        .check("capacity", validate_positive(draft.capacity, "Capacity"));
    errors.finish()
}

pub fn validate_facility_draft(draft: &FacilityDraft) -> Result<(), ValidationError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("name", validate_required(&draft.name, "Facility name", 100))
        .check("quantity", validate_positive(draft.quantity, "Quantity"));
    errors.finish()
}

pub fn validate_review_draft(draft: &ReviewDraft) -> Result<(), ValidationError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("rating", validate_rating(draft.rating))
        .check("comment", validate_required(&draft.comment, "Comment", 1000));
    errors.finish()
}
