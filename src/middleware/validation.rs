//! Declarative per-route input validation.
//!
//! Each route installs one rule set; every rule is evaluated and every
//! violation reported, so a caller sees all failing fields at once rather
//! than fixing them one request at a time. Body rules buffer and re-attach
//! the request body, which caps accepted payloads at [`MAX_BODY_BYTES`].

use crate::domain::error::{ApiError, ErrorCode, FieldError};
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    response::{IntoResponse, Response},
};
use chrono::DateTime;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::warn;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Constraint applied to one body field.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Field must be present and a JSON boolean.
    RequiredBool,
    /// Field must be present and a JSON number within the closed bounds.
    RequiredNumber {
        min: Option<f64>,
        max: Option<f64>,
        range_message: &'static str,
    },
    /// Field may be absent; if present it must parse as an RFC 3339 timestamp.
    OptionalTimestamp,
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: &'static str,
    pub kind: RuleKind,
    pub required_message: &'static str,
    pub type_message: &'static str,
}

/// `status` required boolean, `date` optional timestamp.
pub fn diode_rules() -> Vec<FieldRule> {
    vec![
        FieldRule {
            field: "status",
            kind: RuleKind::RequiredBool,
            required_message: "Status is required",
            type_message: "Status must be a boolean (true/false)",
        },
        date_rule(),
    ]
}

/// `value` required number ≥ 0, `date` optional timestamp.
pub fn light_intensity_rules() -> Vec<FieldRule> {
    non_negative_value_rules()
}

/// `value` required number ≥ 0, `date` optional timestamp.
pub fn water_level_rules() -> Vec<FieldRule> {
    non_negative_value_rules()
}

/// `value` required number above absolute zero, `date` optional timestamp.
pub fn temperature_rules() -> Vec<FieldRule> {
    vec![
        FieldRule {
            field: "value",
            kind: RuleKind::RequiredNumber {
                min: Some(-273.15),
                max: None,
                range_message: "Value must be above absolute zero (-273.15°C)",
            },
            required_message: "Value is required",
            type_message: "Value must be a number",
        },
        date_rule(),
    ]
}

/// `value` required number in [0, 100], `date` optional timestamp.
pub fn humidity_rules() -> Vec<FieldRule> {
    vec![
        FieldRule {
            field: "value",
            kind: RuleKind::RequiredNumber {
                min: Some(0.0),
                max: Some(100.0),
                range_message: "Value must be between 0 and 100",
            },
            required_message: "Value is required",
            type_message: "Value must be a number",
        },
        date_rule(),
    ]
}

fn non_negative_value_rules() -> Vec<FieldRule> {
    vec![
        FieldRule {
            field: "value",
            kind: RuleKind::RequiredNumber {
                min: Some(0.0),
                max: None,
                range_message: "Value must be a positive number",
            },
            required_message: "Value is required",
            type_message: "Value must be a number",
        },
        date_rule(),
    ]
}

fn date_rule() -> FieldRule {
    FieldRule {
        field: "date",
        kind: RuleKind::OptionalTimestamp,
        required_message: "",
        type_message: "Date must be in ISO 8601 format (e.g., 2025-11-07T10:30:00Z)",
    }
}

/// Evaluate every rule against the parsed body, collecting all failures.
pub(crate) fn validate_body(rules: &[FieldRule], body: &Value) -> Vec<FieldError> {
    let mut errors = Vec::new();
    for rule in rules {
        let value = body.get(rule.field);
        match &rule.kind {
            RuleKind::RequiredBool => match value {
                None | Some(Value::Null) => errors.push(FieldError {
                    field: rule.field.to_string(),
                    message: rule.required_message.to_string(),
                }),
                Some(Value::Bool(_)) => {}
                Some(_) => errors.push(FieldError {
                    field: rule.field.to_string(),
                    message: rule.type_message.to_string(),
                }),
            },
            RuleKind::RequiredNumber {
                min,
                max,
                range_message,
            } => match value {
                None | Some(Value::Null) => errors.push(FieldError {
                    field: rule.field.to_string(),
                    message: rule.required_message.to_string(),
                }),
                Some(Value::Number(n)) => {
                    let n = n.as_f64().unwrap_or(f64::NAN);
                    let below = min.map(|min| n < min).unwrap_or(false);
                    let above = max.map(|max| n > max).unwrap_or(false);
                    if below || above || n.is_nan() {
                        errors.push(FieldError {
                            field: rule.field.to_string(),
                            message: range_message.to_string(),
                        });
                    }
                }
                Some(_) => errors.push(FieldError {
                    field: rule.field.to_string(),
                    message: rule.type_message.to_string(),
                }),
            },
            RuleKind::OptionalTimestamp => match value {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) if DateTime::parse_from_rfc3339(s).is_ok() => {}
                Some(_) => errors.push(FieldError {
                    field: rule.field.to_string(),
                    message: rule.type_message.to_string(),
                }),
            },
        }
    }
    errors
}

fn looks_like_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| matches!(i, 4 | 7) || b.is_ascii_digit())
}

/// Validate the `startDate`/`endDate`/`limit`/`skip` query parameters.
///
/// Shape checks only; calendar validity is re-checked where the range is
/// actually resolved. The before/after comparison works on the raw
/// strings, which is sound for the fixed `YYYY-MM-DD` shape.
pub(crate) fn validate_date_range_query(query: &HashMap<String, String>) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let start = query.get("startDate").map(String::as_str);
    let end = query.get("endDate").map(String::as_str);

    match start {
        None | Some("") => errors.push(FieldError {
            field: "startDate".to_string(),
            message: "Start date is required".to_string(),
        }),
        Some(s) if !looks_like_date(s) => errors.push(FieldError {
            field: "startDate".to_string(),
            message: "Start date must be in YYYY-MM-DD format".to_string(),
        }),
        Some(_) => {}
    }

    match end {
        None | Some("") => errors.push(FieldError {
            field: "endDate".to_string(),
            message: "End date is required".to_string(),
        }),
        Some(s) if !looks_like_date(s) => errors.push(FieldError {
            field: "endDate".to_string(),
            message: "End date must be in YYYY-MM-DD format".to_string(),
        }),
        Some(_) => {}
    }

    if let (Some(start), Some(end)) = (start, end) {
        if looks_like_date(start) && looks_like_date(end) && end < start {
            errors.push(FieldError {
                field: "endDate".to_string(),
                message: "End date must be after start date".to_string(),
            });
        }
    }

    if let Some(limit) = query.get("limit") {
        match limit.parse::<i64>() {
            Ok(n) if (1..=1000).contains(&n) => {}
            _ => errors.push(FieldError {
                field: "limit".to_string(),
                message: "Limit must be between 1 and 1000".to_string(),
            }),
        }
    }

    if let Some(skip) = query.get("skip") {
        match skip.parse::<i64>() {
            Ok(n) if n >= 0 => {}
            _ => errors.push(FieldError {
                field: "skip".to_string(),
                message: "Skip must be a positive number".to_string(),
            }),
        }
    }

    errors
}

#[derive(Clone)]
enum Target {
    /// Validate the JSON body of POST requests; other methods pass through.
    Body(Arc<Vec<FieldRule>>),
    /// Validate the query string.
    DateRangeQuery,
}

/// Per-route validation layer.
#[derive(Clone)]
pub struct ValidationLayer {
    target: Target,
}

impl ValidationLayer {
    pub fn body(rules: Vec<FieldRule>) -> Self {
        Self {
            target: Target::Body(Arc::new(rules)),
        }
    }

    pub fn date_range() -> Self {
        Self {
            target: Target::DateRangeQuery,
        }
    }
}

impl<S> Layer<S> for ValidationLayer {
    type Service = ValidationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ValidationService {
            inner,
            target: self.target.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ValidationService<S> {
    inner: S,
    target: Target,
}

impl<S> Service<Request<Body>> for ValidationService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let target = self.target.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match target {
                Target::Body(rules) => {
                    if req.method() != Method::POST {
                        return inner.call(req).await;
                    }

                    let (parts, body) = req.into_parts();
                    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
                        Ok(bytes) => bytes,
                        Err(_) => {
                            return Ok(ApiError::new(
                                ErrorCode::InvalidInput,
                                "Request body could not be read",
                            )
                            .into_response());
                        }
                    };

                    let parsed: Value = match serde_json::from_slice(&bytes) {
                        Ok(value) => value,
                        Err(_) => {
                            warn!(path = %parts.uri.path(), "Rejected non-JSON request body");
                            return Ok(ApiError::new(
                                ErrorCode::InvalidInput,
                                "Request body must be valid JSON",
                            )
                            .into_response());
                        }
                    };

                    let errors = validate_body(&rules, &parsed);
                    if !errors.is_empty() {
                        warn!(
                            path = %parts.uri.path(),
                            fields = errors.len(),
                            "Request failed validation"
                        );
                        return Ok(ApiError::validation(errors).into_response());
                    }

                    let req = Request::from_parts(parts, Body::from(bytes));
                    inner.call(req).await
                }
                Target::DateRangeQuery => {
                    let query: HashMap<String, String> = req
                        .uri()
                        .query()
                        .map(|q| {
                            form_urlencoded::parse(q.as_bytes())
                                .into_owned()
                                .collect()
                        })
                        .unwrap_or_default();

                    let errors = validate_date_range_query(&query);
                    if !errors.is_empty() {
                        warn!(
                            path = %req.uri().path(),
                            fields = errors.len(),
                            "Date-range query failed validation"
                        );
                        return Ok(ApiError::validation(errors).into_response());
                    }

                    inner.call(req).await
                }
            }
        })
    }
}
