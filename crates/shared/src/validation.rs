//! Declarative form rules shared by the post, professor, student and login
//! forms. Each schema is a list of fields with the rules checked against it;
//! the first failing rule per field produces that field's message.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{FieldError, ValidationErrors},
    protocol::{
        NewPost, NewProfessor, NewStudent, PostChanges, ProfessorChanges, StudentChanges,
    },
};

pub static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("valid email pattern")
});

#[derive(Debug, Clone)]
pub enum Rule {
    Required(&'static str),
    MinLength(usize, &'static str),
    MaxLength(usize, &'static str),
    Pattern(&'static Lazy<Regex>, &'static str),
}

impl Rule {
    fn check(&self, value: Option<&str>) -> Option<&'static str> {
        let value = value.unwrap_or_default();
        match self {
            Rule::Required(message) => value.trim().is_empty().then_some(*message),
            // Length and pattern rules only apply once something was typed.
            _ if value.is_empty() => None,
            Rule::MinLength(min, message) => (value.chars().count() < *min).then_some(*message),
            Rule::MaxLength(max, message) => (value.chars().count() > *max).then_some(*message),
            Rule::Pattern(pattern, message) => (!pattern.is_match(value)).then_some(*message),
        }
    }
}

/// Read access to the field values of a form.
pub trait FormValues {
    /// `None` means the field is absent, which matters for partial updates.
    fn value(&self, field: &str) -> Option<&str>;
}

impl FormValues for BTreeMap<String, String> {
    fn value(&self, field: &str) -> Option<&str> {
        self.get(field).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct FormSchema {
    fields: Vec<(&'static str, Vec<Rule>)>,
}

impl FormSchema {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn field(mut self, name: &'static str, rules: Vec<Rule>) -> Self {
        self.fields.push((name, rules));
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    /// Checks every field, treating absent values as empty.
    pub fn validate(&self, values: &impl FormValues) -> Result<(), ValidationErrors> {
        self.run(values, false)
    }

    /// Checks only the fields present in `values`; used for partial updates.
    pub fn validate_present(&self, values: &impl FormValues) -> Result<(), ValidationErrors> {
        self.run(values, true)
    }

    fn run(&self, values: &impl FormValues, skip_absent: bool) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        for (name, rules) in &self.fields {
            let value = values.value(name);
            if skip_absent && value.is_none() {
                continue;
            }
            if let Some(message) = rules.iter().find_map(|rule| rule.check(value)) {
                errors.push(FieldError::new(*name, message));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { errors })
        }
    }
}

impl Default for FormSchema {
    fn default() -> Self {
        Self::new()
    }
}

pub fn post_schema() -> FormSchema {
    FormSchema::new()
        .field(
            "title",
            vec![
                Rule::Required("Title is required"),
                Rule::MinLength(3, "Title must be at least 3 characters"),
                Rule::MaxLength(200, "Title must be at most 200 characters"),
            ],
        )
        .field(
            "author",
            vec![
                Rule::Required("Author is required"),
                Rule::MinLength(2, "Author name must be at least 2 characters"),
            ],
        )
        .field(
            "body",
            vec![
                Rule::Required("Content is required"),
                Rule::MinLength(10, "Content must be at least 10 characters"),
            ],
        )
}

fn person_schema() -> FormSchema {
    FormSchema::new()
        .field(
            "name",
            vec![
                Rule::Required("Name is required"),
                Rule::MinLength(2, "Name must be at least 2 characters"),
            ],
        )
        .field(
            "email",
            vec![
                Rule::Required("Email is required"),
                Rule::Pattern(&EMAIL_PATTERN, "Invalid email"),
            ],
        )
}

pub fn professor_schema() -> FormSchema {
    person_schema()
}

pub fn student_schema() -> FormSchema {
    person_schema()
}

pub fn login_schema() -> FormSchema {
    FormSchema::new()
        .field(
            "email",
            vec![
                Rule::Required("Email is required"),
                Rule::Pattern(&EMAIL_PATTERN, "Invalid email"),
            ],
        )
        .field(
            "password",
            vec![
                Rule::Required("Password is required"),
                Rule::MinLength(6, "Password must be at least 6 characters"),
            ],
        )
}

/// Client-side check run before a payload is sent.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

macro_rules! validate_with {
    ($payload:ty, $schema:ident, $method:ident) => {
        impl Validate for $payload {
            fn validate(&self) -> Result<(), ValidationErrors> {
                $schema().$method(self)
            }
        }
    };
}

validate_with!(NewPost, post_schema, validate);
validate_with!(PostChanges, post_schema, validate_present);
validate_with!(NewProfessor, professor_schema, validate);
validate_with!(ProfessorChanges, professor_schema, validate_present);
validate_with!(NewStudent, student_schema, validate);
validate_with!(StudentChanges, student_schema, validate_present);

/// Login form input.
#[derive(Debug, Clone)]
pub struct LoginForm<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

impl FormValues for LoginForm<'_> {
    fn value(&self, field: &str) -> Option<&str> {
        match field {
            "email" => Some(self.email),
            "password" => Some(self.password),
            _ => None,
        }
    }
}

impl FormValues for NewPost {
    fn value(&self, field: &str) -> Option<&str> {
        match field {
            "title" => Some(&self.title),
            "body" => Some(&self.body),
            "author" => Some(&self.author),
            "subject" => self.subject.as_deref(),
            _ => None,
        }
    }
}

impl FormValues for PostChanges {
    fn value(&self, field: &str) -> Option<&str> {
        match field {
            "title" => self.title.as_deref(),
            "body" => self.body.as_deref(),
            "author" => self.author.as_deref(),
            "subject" => self.subject.as_deref(),
            _ => None,
        }
    }
}

impl FormValues for NewProfessor {
    fn value(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(&self.name),
            "email" => Some(&self.email),
            "subject" => self.subject.as_deref(),
            _ => None,
        }
    }
}

impl FormValues for ProfessorChanges {
    fn value(&self, field: &str) -> Option<&str> {
        match field {
            "name" => self.name.as_deref(),
            "email" => self.email.as_deref(),
            "subject" => self.subject.as_deref(),
            _ => None,
        }
    }
}

impl FormValues for NewStudent {
    fn value(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(&self.name),
            "email" => Some(&self.email),
            "className" => self.class_name.as_deref(),
            _ => None,
        }
    }
}

impl FormValues for StudentChanges {
    fn value(&self, field: &str) -> Option<&str> {
        match field {
            "name" => self.name.as_deref(),
            "email" => self.email.as_deref(),
            "className" => self.class_name.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str, body: &str, author: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            body: body.to_string(),
            author: author.to_string(),
            subject: None,
            tags: None,
        }
    }

    #[test]
    fn accepts_valid_post() {
        assert!(post_schema()
            .validate(&post("Fractions", "Halves and quarters", "Ana"))
            .is_ok());
    }

    #[test]
    fn reports_first_failing_rule_per_field_in_schema_order() {
        let err = post_schema()
            .validate(&post("ab", "", "A"))
            .expect_err("invalid post");
        assert_eq!(
            err.messages(),
            vec![
                "Title must be at least 3 characters",
                "Author name must be at least 2 characters",
                "Content is required",
            ]
        );
    }

    #[test]
    fn whitespace_only_value_fails_required() {
        let err = post_schema()
            .validate(&post("   ", "long enough body", "Ana"))
            .expect_err("blank title");
        assert_eq!(err.for_field("title"), Some("Title is required"));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let form = LoginForm {
            email: "prof@blog.com",
            password: "ééééé",
        };
        let err = login_schema().validate(&form).expect_err("five chars");
        assert_eq!(
            err.for_field("password"),
            Some("Password must be at least 6 characters")
        );
        let form = LoginForm {
            email: "prof@blog.com",
            password: "éééééé",
        };
        assert!(login_schema().validate(&form).is_ok());
    }

    #[test]
    fn title_longer_than_limit_is_rejected() {
        let title = "x".repeat(201);
        let err = post_schema()
            .validate(&post(&title, "long enough body", "Ana"))
            .expect_err("too long");
        assert_eq!(
            err.for_field("title"),
            Some("Title must be at most 200 characters")
        );
    }

    #[test]
    fn email_pattern_is_case_insensitive() {
        assert!(EMAIL_PATTERN.is_match("Professor@Blog.COM"));
        assert!(!EMAIL_PATTERN.is_match("professor@blog"));
        assert!(!EMAIL_PATTERN.is_match("not an email"));
    }

    #[test]
    fn partial_update_skips_absent_fields() {
        let changes = StudentChanges {
            class_name: Some("9B".to_string()),
            ..StudentChanges::default()
        };
        assert!(student_schema().validate_present(&changes).is_ok());

        let changes = StudentChanges {
            email: Some("bad".to_string()),
            ..StudentChanges::default()
        };
        let err = student_schema()
            .validate_present(&changes)
            .expect_err("bad email");
        assert_eq!(err.to_string(), "Invalid email");
    }
}
