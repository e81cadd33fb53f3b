//! In-memory stand-in for the todo manager, for unit tests.
//!
//! Models what the probes rely on: the three collections, item routes, the
//! four relation routes, `405` for unsupported verbs, `400` for malformed
//! JSON or a numeric `id` in a create payload. XML bodies are always
//! rejected.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::{Map, Value, json};

use super::client::Transport;
use super::error::ApiError;
use super::method::HttpMethod;
use super::request::{ApiRequest, Payload};
use super::response::ApiResponse;
use crate::domain::Collection;

const BASE_URL: &str = "http://fake.invalid";

#[derive(Clone, Default)]
pub struct InMemoryService {
    state: Rc<RefCell<ServiceState>>,
}

#[derive(Default)]
struct ServiceState {
    next_id: BTreeMap<Collection, u64>,
    entities: BTreeMap<Collection, BTreeMap<u64, Map<String, Value>>>,
    links: Vec<Link>,
    log: Vec<String>,
    down: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct Link {
    parent: Collection,
    parent_id: u64,
    relation: &'static str,
    child_id: u64,
}

/// Child collection and listing key for a relation route.
fn relation(parent: Collection, segment: &str) -> Option<(&'static str, Collection)> {
    match (parent, segment) {
        (Collection::Todos, "categories") => Some(("categories", Collection::Categories)),
        (Collection::Todos, "tasksof") => Some(("tasksof", Collection::Projects)),
        (Collection::Projects, "categories") => Some(("categories", Collection::Categories)),
        (Collection::Projects, "tasks") => Some(("tasks", Collection::Todos)),
        _ => None,
    }
}

impl InMemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entity directly, bypassing validation.
    pub fn seed(&self, collection: Collection, fields: Value) -> String {
        let fields = fields.as_object().cloned().unwrap_or_default();
        let id = self.state.borrow_mut().insert(collection, fields);
        id.to_string()
    }

    pub fn titles(&self, collection: Collection) -> Vec<String> {
        let state = self.state.borrow();
        state
            .entities
            .get(&collection)
            .map(|items| {
                items
                    .values()
                    .map(|fields| fields.get("title").and_then(Value::as_str).unwrap_or("").to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn entity(&self, collection: Collection, id: &str) -> Option<Value> {
        let id = id.parse::<u64>().ok()?;
        let state = self.state.borrow();
        state
            .entities
            .get(&collection)
            .and_then(|items| items.get(&id))
            .map(|fields| Value::Object(fields.clone()))
    }

    /// Every later request fails as if the server were gone.
    pub fn go_down(&self) {
        self.state.borrow_mut().down = true;
    }

    /// `METHOD /path` lines for every request received so far.
    pub fn requests(&self) -> Vec<String> {
        self.state.borrow().log.clone()
    }
}

impl Transport for InMemoryService {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut state = self.state.borrow_mut();
        state.log.push(format!("{} {}", request.method, request.path));
        if state.down {
            return Err(ApiError::Unreachable {
                url: format!("{BASE_URL}{}", request.path),
                source: Box::new(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)),
            });
        }
        Ok(state.handle(request))
    }

    fn base_url(&self) -> &str {
        BASE_URL
    }
}

impl ServiceState {
    fn handle(&mut self, request: &ApiRequest) -> ApiResponse {
        let segments: Vec<&str> = request.path.split('/').filter(|s| !s.is_empty()).collect();
        let method = request.method;

        match segments.as_slice() {
            [] => match method {
                HttpMethod::Get | HttpMethod::Head => ApiResponse::new(200, ""),
                _ => ApiResponse::new(405, ""),
            },
            ["shutdown"] => {
                self.down = true;
                ApiResponse::new(200, "")
            }
            [name, rest @ ..] => match Collection::from_key(name) {
                Some(collection) => self.route(collection, rest, request),
                None => not_found(&request.path),
            },
        }
    }

    fn route(&mut self, collection: Collection, rest: &[&str], request: &ApiRequest) -> ApiResponse {
        let method = request.method;
        match rest {
            [] => match method {
                HttpMethod::Get => self.listing(collection.key(), self.all(collection)),
                HttpMethod::Head | HttpMethod::Options => ApiResponse::new(200, ""),
                HttpMethod::Post => self.create(collection, request.payload.as_ref()),
                _ => ApiResponse::new(405, ""),
            },
            [id] => self.item(collection, id, request),
            [id, segment] => match relation(collection, segment) {
                Some((relation, child)) => self.relation(collection, id, relation, child, request),
                None => not_found(&request.path),
            },
            [id, segment, child_id] => match relation(collection, segment) {
                Some((relation, _)) if method == HttpMethod::Delete => {
                    self.unlink(collection, id, relation, child_id, &request.path)
                }
                Some(_) => ApiResponse::new(405, ""),
                None => not_found(&request.path),
            },
            _ => not_found(&request.path),
        }
    }

    fn item(&mut self, collection: Collection, raw_id: &str, request: &ApiRequest) -> ApiResponse {
        match request.method {
            HttpMethod::Patch => return ApiResponse::new(405, ""),
            HttpMethod::Options => return ApiResponse::new(200, ""),
            _ => {}
        }
        let Some(id) = self.existing(collection, raw_id) else {
            return match request.method {
                HttpMethod::Post | HttpMethod::Put => {
                    error(404, &format!("Invalid GUID for {raw_id} entity {}", singular(collection)))
                }
                HttpMethod::Delete => error(
                    404,
                    &format!("Could not find any instances with {}", request.path.trim_start_matches('/')),
                ),
                _ => not_found(&request.path),
            };
        };

        match request.method {
            HttpMethod::Get => {
                let item = self.get(collection, id);
                self.listing(collection.key(), vec![item])
            }
            HttpMethod::Head => ApiResponse::new(200, ""),
            HttpMethod::Post | HttpMethod::Put => {
                let fields = match parse_payload(request.payload.as_ref()) {
                    Ok(fields) => fields,
                    Err(response) => return response,
                };
                let entity = self
                    .entities
                    .entry(collection)
                    .or_default()
                    .get_mut(&id)
                    .expect("existing entity");
                for (key, value) in normalize(collection, fields, false) {
                    if key != "id" {
                        entity.insert(key, value);
                    }
                }
                ApiResponse::new(200, Value::Object(entity.clone()).to_string())
            }
            HttpMethod::Delete => {
                self.entities.entry(collection).or_default().remove(&id);
                self.links.retain(|link| !(link.parent == collection && link.parent_id == id));
                ApiResponse::new(200, "")
            }
            HttpMethod::Patch | HttpMethod::Options => unreachable!("handled above"),
        }
    }

    fn relation(
        &mut self,
        parent: Collection,
        raw_id: &str,
        relation: &'static str,
        child: Collection,
        request: &ApiRequest,
    ) -> ApiResponse {
        match request.method {
            HttpMethod::Put | HttpMethod::Patch | HttpMethod::Delete => return ApiResponse::new(405, ""),
            HttpMethod::Options => return ApiResponse::new(200, ""),
            _ => {}
        }
        let Some(parent_id) = self.existing(parent, raw_id) else {
            if request.method == HttpMethod::Post {
                return error(
                    404,
                    &format!(
                        "Could not find parent thing for relationship {}",
                        request.path.trim_start_matches('/')
                    ),
                );
            }
            return not_found(&request.path);
        };

        match request.method {
            HttpMethod::Get => {
                let children: Vec<Value> = self
                    .links
                    .iter()
                    .filter(|link| link.parent == parent && link.parent_id == parent_id && link.relation == relation)
                    .filter_map(|link| self.entities.get(&child)?.get(&link.child_id).cloned())
                    .map(Value::Object)
                    .collect();
                self.listing(child.key(), children)
            }
            HttpMethod::Head => ApiResponse::new(200, ""),
            _ => {
                let mut fields = match parse_payload(request.payload.as_ref()) {
                    Ok(fields) => fields,
                    Err(response) => return response,
                };
                let child_id = match fields.remove("id") {
                    Some(Value::Number(_)) => return bad_request("Not allowed to create with id"),
                    Some(Value::String(raw)) => match self.existing(child, &raw) {
                        Some(existing) => existing,
                        None => self.insert(child, fields),
                    },
                    _ => {
                        if child == Collection::Todos && !fields.contains_key("title") {
                            return bad_request("title : field is mandatory");
                        }
                        self.insert(child, fields)
                    }
                };
                self.links.push(Link {
                    parent,
                    parent_id,
                    relation,
                    child_id,
                });
                ApiResponse::new(201, self.get(child, child_id).to_string())
            }
        }
    }

    fn unlink(&mut self, parent: Collection, raw_id: &str, relation: &str, raw_child: &str, path: &str) -> ApiResponse {
        let (Ok(parent_id), Ok(child_id)) = (raw_id.parse::<u64>(), raw_child.parse::<u64>()) else {
            return not_found(path);
        };
        let before = self.links.len();
        self.links.retain(|link| {
            !(link.parent == parent && link.parent_id == parent_id && link.relation == relation && link.child_id == child_id)
        });
        if self.links.len() == before {
            not_found(path)
        } else {
            ApiResponse::new(200, "")
        }
    }

    fn create(&mut self, collection: Collection, payload: Option<&Payload>) -> ApiResponse {
        let fields = match parse_payload(payload) {
            Ok(fields) => fields,
            Err(response) => return response,
        };
        if fields.contains_key("id") {
            return bad_request("Not allowed to create with id");
        }
        if collection == Collection::Todos && !fields.contains_key("title") {
            return bad_request("title : field is mandatory");
        }
        let id = self.insert(collection, fields);
        ApiResponse::new(201, self.get(collection, id).to_string())
    }

    fn insert(&mut self, collection: Collection, fields: Map<String, Value>) -> u64 {
        let counter = self.next_id.entry(collection).or_insert(0);
        *counter += 1;
        let id = *counter;
        let mut entity = normalize(collection, fields, true);
        entity.insert("id".into(), Value::String(id.to_string()));
        self.entities.entry(collection).or_default().insert(id, entity);
        id
    }

    fn existing(&self, collection: Collection, raw_id: &str) -> Option<u64> {
        let id = raw_id.parse::<u64>().ok()?;
        self.entities.get(&collection)?.contains_key(&id).then_some(id)
    }

    fn get(&self, collection: Collection, id: u64) -> Value {
        self.entities
            .get(&collection)
            .and_then(|items| items.get(&id))
            .map(|fields| Value::Object(fields.clone()))
            .unwrap_or(Value::Null)
    }

    fn all(&self, collection: Collection) -> Vec<Value> {
        self.entities
            .get(&collection)
            .map(|items| items.values().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    fn listing(&self, key: &str, items: Vec<Value>) -> ApiResponse {
        let mut body = Map::new();
        body.insert(key.to_string(), Value::Array(items));
        ApiResponse::new(200, Value::Object(body).to_string())
    }
}

fn parse_payload(payload: Option<&Payload>) -> Result<Map<String, Value>, ApiResponse> {
    match payload {
        None => Ok(Map::new()),
        Some(Payload::Json(Value::Object(fields))) => Ok(fields.clone()),
        Some(Payload::Json(_)) => Err(bad_request("expected a JSON object")),
        Some(Payload::Raw { content_type, body }) if content_type.contains("json") => {
            serde_json::from_str::<Map<String, Value>>(body).map_err(|e| bad_request(&e.to_string()))
        }
        Some(Payload::Raw { .. }) => Err(bad_request("unsupported payload")),
    }
}

/// Stores status fields as the `"true"`/`"false"` strings the real service
/// uses; `fill` adds defaults for missing fields.
fn normalize(collection: Collection, mut fields: Map<String, Value>, fill: bool) -> Map<String, Value> {
    for field in collection.status_fields() {
        match fields.get(*field) {
            Some(Value::Bool(flag)) => {
                fields.insert((*field).to_string(), Value::String(flag.to_string()));
            }
            None if fill => {
                fields.insert((*field).to_string(), Value::String("false".into()));
            }
            _ => {}
        }
    }
    if fill {
        for key in ["title", "description"] {
            fields.entry(key).or_insert_with(|| Value::String(String::new()));
        }
    }
    fields
}

fn singular(collection: Collection) -> &'static str {
    match collection {
        Collection::Todos => "todo",
        Collection::Projects => "project",
        Collection::Categories => "category",
    }
}

fn error(status: u16, message: &str) -> ApiResponse {
    ApiResponse::new(status, json!({"errorMessages": [message]}).to_string())
}

fn not_found(path: &str) -> ApiResponse {
    error(
        404,
        &format!("Could not find an instance with {}", path.trim_start_matches('/')),
    )
}

fn bad_request(message: &str) -> ApiResponse {
    error(400, &format!("Invalid Creation: Failed Validation: {message}"))
}
