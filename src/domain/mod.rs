//! Generic view of the resources the todo manager exposes.
//!
//! The service owns identity and field semantics; this crate only needs a
//! title, a description, a few boolean status fields and whatever else the
//! service chooses to send along.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level collection endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Todos,
    Projects,
    Categories,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Todos, Collection::Projects, Collection::Categories];

    /// Path segment, also the key listings are wrapped in.
    pub const fn key(self) -> &'static str {
        match self {
            Collection::Todos => "todos",
            Collection::Projects => "projects",
            Collection::Categories => "categories",
        }
    }

    #[cfg(test)]
    pub fn from_key(key: &str) -> Option<Self> {
        Collection::ALL.into_iter().find(|collection| collection.key() == key)
    }

    pub fn path(self) -> String {
        format!("/{}", self.key())
    }

    pub fn item_path(self, id: &str) -> String {
        format!("/{}/{id}", self.key())
    }

    /// Boolean fields the service keeps per entity, serialised as
    /// `"true"`/`"false"` strings.
    pub const fn status_fields(self) -> &'static [&'static str] {
        match self {
            Collection::Todos => &["doneStatus"],
            Collection::Projects => &["completed", "active"],
            Collection::Categories => &[],
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: String,
    pub title: String,
    pub description: String,
    pub extra: Map<String, Value>,
}

impl Entity {
    /// Reads one element of a listing. Elements without an id are not
    /// entities and yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let mut fields = value.as_object()?.clone();
        let id = match fields.remove("id")? {
            Value::String(id) => id,
            Value::Number(id) => id.to_string(),
            _ => return None,
        };
        let title = take_text(&mut fields, "title");
        let description = take_text(&mut fields, "description");

        Some(Self {
            id,
            title,
            description,
            extra: fields,
        })
    }

    /// A boolean status field. Accepts JSON booleans and the strings the
    /// service uses, case-insensitively.
    pub fn flag(&self, field: &str) -> Option<bool> {
        match self.extra.get(field)? {
            Value::Bool(flag) => Some(*flag),
            Value::String(raw) if raw.eq_ignore_ascii_case("true") => Some(true),
            Value::String(raw) if raw.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }
}

fn take_text(fields: &mut Map<String, Value>, key: &str) -> String {
    match fields.remove(key) {
        Some(Value::String(text)) => text,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_splits_known_fields() {
        let entity = Entity::from_value(&json!({
            "id": "3",
            "title": "Pay Bills",
            "doneStatus": "false",
            "tasksof": [{"id": "1"}]
        }))
        .unwrap();

        assert_eq!(entity.id, "3");
        assert_eq!(entity.title, "Pay Bills");
        assert_eq!(entity.description, "");
        assert_eq!(entity.flag("doneStatus"), Some(false));
        assert!(entity.extra.contains_key("tasksof"));
    }

    #[test]
    fn from_value_requires_an_id() {
        assert!(Entity::from_value(&json!({"title": "orphan"})).is_none());
        assert!(Entity::from_value(&json!("todos")).is_none());
        assert_eq!(Entity::from_value(&json!({"id": 4})).unwrap().id, "4");
    }

    #[test]
    fn flag_parses_service_strings() {
        let entity = Entity::from_value(&json!({"id": "1", "completed": "TRUE", "active": false})).unwrap();
        assert_eq!(entity.flag("completed"), Some(true));
        assert_eq!(entity.flag("active"), Some(false));
        assert_eq!(entity.flag("doneStatus"), None);
    }

    #[test]
    fn collection_paths() {
        assert_eq!(Collection::Todos.path(), "/todos");
        assert_eq!(Collection::Categories.item_path("9"), "/categories/9");
        assert_eq!(Collection::from_key("projects"), Some(Collection::Projects));
        assert_eq!(Collection::from_key("tasks"), None);
    }
}
