//! Field validation for the user DTOs.
//!
//! Rules are declared with `validator` derives on one rule set per operation.
//! Every rule of every field runs, so a client sees all problems at once.
//! Field names in the result match the JSON (camelCase) names.

use std::sync::LazyLock;

use axum_helpers::FieldErrors;
use chrono::{Datelike, Local, Months, NaiveDate};
use regex::Regex;
use validator::{Validate, ValidateArgs, ValidationError};

use crate::models::{CreateUser, UpdateUser};

pub const MINIMUM_AGE: i32 = 18;

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d{2}\)\s?\d{4,5}-\d{4}$").unwrap());

/// Field-level validation failures, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(FieldErrors);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> FieldErrors {
        self.0
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.fields().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl From<validator::ValidationErrors> for ValidationErrors {
    fn from(source: validator::ValidationErrors) -> Self {
        let mut errors = Self::new();
        for (field, failures) in source.field_errors() {
            let field = camel_case(&field);
            let mut failures: Vec<&ValidationError> = failures.iter().collect();
            failures.sort_by_key(|failure| rule_rank(&failure.code));
            for failure in failures {
                errors.add(&field, message_for(&field, failure));
            }
        }
        errors
    }
}

/// A set of rules for one DTO.
pub trait Validator<T>: Send + Sync {
    fn validate(&self, input: &T) -> ValidationErrors;
}

/// Rules for `POST /users`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateUserValidator {
    today: Option<NaiveDate>,
}

impl CreateUserValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the date used for the age rule.
    pub fn with_today(today: NaiveDate) -> Self {
        Self { today: Some(today) }
    }
}

impl Validator<CreateUser> for CreateUserValidator {
    fn validate(&self, input: &CreateUser) -> ValidationErrors {
        let today = self.today.unwrap_or_else(local_today);
        collect(CreateUserRules::from(input).validate_with_args(&today))
    }
}

/// Rules for `PUT /users/{id}`.
///
/// Unlike creation there is no email length rule, the phone format is
/// enforced and `active` must be present.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateUserValidator {
    today: Option<NaiveDate>,
}

impl UpdateUserValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the date used for the age rule.
    pub fn with_today(today: NaiveDate) -> Self {
        Self { today: Some(today) }
    }
}

impl Validator<UpdateUser> for UpdateUserValidator {
    fn validate(&self, input: &UpdateUser) -> ValidationErrors {
        let today = self.today.unwrap_or_else(local_today);
        collect(UpdateUserRules::from(input).validate_with_args(&today))
    }
}

/// Create rules. Email is held trimmed, `None` when blank.
#[derive(Validate)]
#[validate(context = NaiveDate)]
struct CreateUserRules {
    #[validate(
        custom(function = "not_blank", message = "Name is required."),
        length(min = 3, max = 100)
    )]
    name: String,
    #[validate(
        required(message = "Email is required."),
        email(message = "Invalid email format."),
        length(max = 150)
    )]
    email: Option<String>,
    #[validate(
        custom(function = "not_blank", message = "Password is required."),
        length(min = 6, max = 100)
    )]
    password: String,
    #[validate(
        required(message = "Birth date is required."),
        custom(function = "adult", use_context, message = "User must be at least 18 years old.")
    )]
    birth_date: Option<NaiveDate>,
    #[validate(length(max = 20))]
    phone: Option<String>,
}

impl From<&CreateUser> for CreateUserRules {
    fn from(input: &CreateUser) -> Self {
        Self {
            name: input.name.clone(),
            email: present(&input.email),
            password: input.password.clone(),
            birth_date: input.birth_date,
            phone: input.phone.clone(),
        }
    }
}

/// Update rules. A blank phone is not checked against the format.
#[derive(Validate)]
#[validate(context = NaiveDate)]
struct UpdateUserRules {
    #[validate(
        custom(function = "not_blank", message = "Name is required."),
        length(min = 3, max = 100)
    )]
    name: String,
    #[validate(
        required(message = "Email is required."),
        email(message = "Invalid email format.")
    )]
    email: Option<String>,
    #[validate(
        required(message = "Birth date is required."),
        custom(function = "adult", use_context, message = "User must be at least 18 years old.")
    )]
    birth_date: Option<NaiveDate>,
    #[validate(
        regex(path = *PHONE_PATTERN, message = "Phone must be in the format (XX) XXXXX-XXXX."),
        length(max = 20)
    )]
    phone: Option<String>,
    #[validate(required(message = "Active is required."))]
    active: Option<bool>,
}

impl From<&UpdateUser> for UpdateUserRules {
    fn from(input: &UpdateUser) -> Self {
        Self {
            name: input.name.clone(),
            email: present(&input.email),
            birth_date: input.birth_date,
            phone: input.phone.as_deref().and_then(present),
            active: input.active,
        }
    }
}

/// Whole years between `birth_date` and `today`. Negative for future dates.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let years = today.year() - birth_date.year();
    if years <= 0 {
        return if birth_date > today { years.min(-1) } else { years };
    }

    // A Feb 29 `today` lands on Feb 28 in non-leap years.
    match today.checked_sub_months(Months::new(years as u32 * 12)) {
        Some(anniversary) if birth_date > anniversary => years - 1,
        _ => years,
    }
}

/// The age rule counts birthdays on the server's local calendar day.
fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

fn adult(birth_date: &NaiveDate, today: &NaiveDate) -> Result<(), ValidationError> {
    if age_on(*birth_date, *today) < MINIMUM_AGE {
        return Err(ValidationError::new("adult"));
    }
    Ok(())
}

fn present(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn collect(result: Result<(), validator::ValidationErrors>) -> ValidationErrors {
    match result {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors.into(),
    }
}

/// Presence first, then format, then length.
fn rule_rank(code: &str) -> u8 {
    match code {
        "required" => 0,
        "email" | "regex" => 1,
        "length" => 2,
        _ => 3,
    }
}

/// Length failures carry no message; it is built from the bounds they report.
fn message_for(field: &str, failure: &ValidationError) -> String {
    if let Some(message) = &failure.message {
        return message.to_string();
    }

    let bound = |name: &str| failure.params.get(name).and_then(|v| v.as_u64());
    let length = failure
        .params
        .get("value")
        .and_then(|v| v.as_str())
        .map(|v| v.chars().count() as u64);
    let label = capitalize(field);

    match (bound("min"), bound("max"), length) {
        (Some(min), _, Some(len)) if len < min => {
            format!("{label} must be at least {min} characters.")
        }
        (_, Some(max), _) => format!("{label} must be at most {max} characters."),
        (Some(min), None, _) => format!("{label} must be at least {min} characters."),
        _ => format!("{label} is invalid."),
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        match c {
            '_' => upper = true,
            c if upper => {
                out.extend(c.to_uppercase());
                upper = false;
            }
            c => out.push(c),
        }
    }
    out
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
