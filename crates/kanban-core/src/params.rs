//! Request body parsing.
//!
//! Bodies arrive either bare (`{"title": ...}`) or wrapped under a `task`
//! key (`{"task": {"title": ...}}`). Each known field is type-checked
//! individually so every problem is reported against its field name instead
//! of failing the whole body on the first mismatch.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::task::TaskStatus;
use crate::validation::{ValidationErrors, NOT_IN_LIST};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A field that may be missing, explicitly null, or set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Field<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> Field<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Collapse null and absent.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Absent | Self::Null => None,
        }
    }

    /// `None` = untouched, `Some(None)` = clear, `Some(Some(v))` = set.
    pub fn into_patch(self) -> Option<Option<T>> {
        match self {
            Self::Absent => None,
            Self::Null => Some(None),
            Self::Value(v) => Some(Some(v)),
        }
    }
}

/// Mutable task fields as sent by a client, not yet validated for presence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskParams {
    pub title: Field<String>,
    pub description: Field<String>,
    pub status: Field<TaskStatus>,
    pub due_date: Field<NaiveDate>,
    pub position: Field<i64>,
}

impl TaskParams {
    pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
        let Some(object) = body.as_object() else {
            return Err(ValidationErrors::single("base", "must be a JSON object"));
        };
        let fields = match object.get("task") {
            Some(Value::Object(inner)) => inner,
            _ => object,
        };

        let mut errors = ValidationErrors::new();
        let params = Self {
            title: string_field(fields, "title", &mut errors),
            description: string_field(fields, "description", &mut errors),
            status: status_field(fields, &mut errors),
            due_date: date_field(fields, &mut errors),
            position: position_field(fields, &mut errors),
        };
        errors.into_result(params)
    }
}

fn string_field(fields: &Map<String, Value>, name: &str, errors: &mut ValidationErrors) -> Field<String> {
    match fields.get(name) {
        None => Field::Absent,
        Some(Value::Null) => Field::Null,
        Some(Value::String(s)) => Field::Value(s.clone()),
        Some(_) => {
            errors.add(name, "must be a string");
            Field::Absent
        }
    }
}

fn status_field(fields: &Map<String, Value>, errors: &mut ValidationErrors) -> Field<TaskStatus> {
    match fields.get("status") {
        None => Field::Absent,
        Some(Value::Null) => Field::Null,
        Some(Value::String(s)) => match s.parse() {
            Ok(status) => Field::Value(status),
            Err(_) => {
                errors.add("status", NOT_IN_LIST);
                Field::Absent
            }
        },
        Some(_) => {
            errors.add("status", NOT_IN_LIST);
            Field::Absent
        }
    }
}

fn date_field(fields: &Map<String, Value>, errors: &mut ValidationErrors) -> Field<NaiveDate> {
    match fields.get("due_date") {
        None => Field::Absent,
        Some(Value::Null) => Field::Null,
        // Empty date inputs submit "".
        Some(Value::String(s)) if s.trim().is_empty() => Field::Null,
        Some(Value::String(s)) => match NaiveDate::parse_from_str(s.trim(), DATE_FORMAT) {
            Ok(date) => Field::Value(date),
            Err(_) => {
                errors.add("due_date", "is not a valid date");
                Field::Absent
            }
        },
        Some(_) => {
            errors.add("due_date", "is not a valid date");
            Field::Absent
        }
    }
}

fn position_field(fields: &Map<String, Value>, errors: &mut ValidationErrors) -> Field<i64> {
    let parsed = match fields.get("position") {
        None => return Field::Absent,
        Some(Value::Null) => return Field::Null,
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };
    match parsed {
        Some(position) => Field::Value(position),
        None => {
            errors.add("position", "must be an integer");
            Field::Absent
        }
    }
}
