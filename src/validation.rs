//! Slug normalization and entity field rules.
//!
//! [`Validate::validate`] rewrites the slug in place before checking it, so
//! the normalized form is kept even when validation fails.

use std::sync::OnceLock;

use regex::Regex;
use strum::VariantNames;
use thiserror::Error;

use crate::entity::{Metric, MetricType, Service};

/// Maximum length of slugs, type names and details.
pub const MAX_FIELD_LEN: usize = 255;

/// Rule a field failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rule {
    #[error("cannot be blank")]
    Required,
    #[error("must contain only latin letters, digits and underscores")]
    Format,
    #[error("the length must be no more than {max}")]
    TooLong { max: usize },
    #[error("must be one of {}", MetricType::VARIANTS.join(", "))]
    UnknownType,
}

/// First field rule an entity failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {rule}")]
pub struct ValidationError {
    pub field: &'static str,
    pub rule: Rule,
}

impl ValidationError {
    fn new(field: &'static str, rule: Rule) -> Self {
        Self { field, rule }
    }
}

/// Entities with a human-assigned slug.
pub trait Validate {
    /// Normalize the slug, then check every field in declaration order.
    fn validate(&mut self) -> Result<(), ValidationError>;
}

/// Collapse whitespace runs into single underscores and uppercase.
///
/// Leading and trailing whitespace is dropped.
pub fn normalize_slug(slug: &str) -> String {
    slug.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

fn slug_regex() -> &'static Regex {
    static SLUG_REGEX: OnceLock<Regex> = OnceLock::new();
    SLUG_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("failed to compile slug regex"))
}

fn check_required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(field, Rule::Required));
    }
    Ok(())
}

fn check_length(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(ValidationError::new(
            field,
            Rule::TooLong { max: MAX_FIELD_LEN },
        ));
    }
    Ok(())
}

fn check_slug(slug: &str) -> Result<(), ValidationError> {
    check_required("slug", slug)?;
    if !slug_regex().is_match(slug) {
        return Err(ValidationError::new("slug", Rule::Format));
    }
    check_length("slug", slug)
}

fn check_metric_type(metric_type: &str) -> Result<(), ValidationError> {
    check_required("metric_type", metric_type)?;
    check_length("metric_type", metric_type)?;
    metric_type
        .parse::<MetricType>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("metric_type", Rule::UnknownType))
}

fn check_details(details: &str) -> Result<(), ValidationError> {
    check_required("details", details)?;
    check_length("details", details)
}

impl Validate for Service {
    fn validate(&mut self) -> Result<(), ValidationError> {
        self.slug = normalize_slug(&self.slug);

        check_slug(&self.slug)?;
        check_details(&self.details)
    }
}

impl Validate for Metric {
    fn validate(&mut self) -> Result<(), ValidationError> {
        self.slug = normalize_slug(&self.slug);

        check_slug(&self.slug)?;
        check_metric_type(&self.metric_type)?;
        check_details(&self.details)
    }
}
