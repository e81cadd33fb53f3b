//! Create and delete domain entities for scenario preconditions.
//!
//! Every create helper requires `201 Created` and hands back the id the
//! service assigned; every delete helper requires `200` or `204`.

use serde_json::{Value, json};

use crate::domain::{Collection, Entity};
use crate::http::ApiClient;
use crate::testing::assert::{DELETED, Failure, expect_status, expect_status_in};

pub fn create_todo(client: &ApiClient, title: &str, description: &str) -> Result<String, Failure> {
    create(
        client,
        "/todos",
        &json!({"title": title, "description": description}),
        "Failed to create todo",
    )
}

pub fn create_project(client: &ApiClient, title: &str, description: &str) -> Result<String, Failure> {
    create(
        client,
        "/projects",
        &json!({"title": title, "description": description}),
        "Failed to create project",
    )
}

pub fn create_category(client: &ApiClient, title: &str, description: &str) -> Result<String, Failure> {
    create(
        client,
        "/categories",
        &json!({"title": title, "description": description}),
        "Failed to create category",
    )
}

pub fn create_category_for_todo(client: &ApiClient, todo_id: &str, title: &str) -> Result<String, Failure> {
    create(
        client,
        &format!("/todos/{todo_id}/categories"),
        &json!({"title": title}),
        &format!("Failed to post category '{title}' for todo {todo_id}"),
    )
}

pub fn create_category_for_project(
    client: &ApiClient,
    project_id: &str,
    title: &str,
    description: &str,
) -> Result<String, Failure> {
    create(
        client,
        &format!("/projects/{project_id}/categories"),
        &json!({"title": title, "description": description}),
        "Failed to create category linked to the project",
    )
}

/// A todo created as a task of the project.
pub fn create_task_for_project(
    client: &ApiClient,
    project_id: &str,
    title: &str,
    description: &str,
) -> Result<String, Failure> {
    create(
        client,
        &format!("/projects/{project_id}/tasks"),
        &json!({"title": title, "description": description}),
        "Failed to create task linked to the project",
    )
}

/// A project the todo is a task of.
pub fn create_task_of_todo(
    client: &ApiClient,
    todo_id: &str,
    title: &str,
    description: &str,
) -> Result<String, Failure> {
    create(
        client,
        &format!("/todos/{todo_id}/tasksof"),
        &json!({"title": title, "description": description}),
        "Failed to create task",
    )
}

pub fn delete_todo(client: &ApiClient, id: &str) -> Result<(), Failure> {
    delete(client, Collection::Todos, id)
}

pub fn delete_project(client: &ApiClient, id: &str) -> Result<(), Failure> {
    delete(client, Collection::Projects, id)
}

pub fn delete_category(client: &ApiClient, id: &str) -> Result<(), Failure> {
    delete(client, Collection::Categories, id)
}

pub fn delete(client: &ApiClient, collection: Collection, id: &str) -> Result<(), Failure> {
    let path = collection.item_path(id);
    let response = client.delete(&path)?;
    expect_status_in(&response, DELETED, &format!("DELETE {path} failed"))
}

/// Everything currently in `collection`. A listing that does not answer
/// `200` counts as empty.
pub fn list(client: &ApiClient, collection: Collection) -> Result<Vec<Entity>, Failure> {
    let response = client.get(&collection.path())?;
    if response.status != 200 {
        tracing::warn!(%collection, status = response.status, "listing did not answer 200");
        return Ok(Vec::new());
    }
    Ok(response
        .items(collection.key())
        .iter()
        .filter_map(Entity::from_value)
        .collect())
}

/// Id of the first todo titled `title`, by a scan over the full listing.
pub fn find_todo_id(client: &ApiClient, title: &str) -> Result<Option<String>, Failure> {
    let response = client.get("/todos")?;
    expect_status(&response, 200, "Failed to retrieve todos")?;
    Ok(response
        .items("todos")
        .iter()
        .filter_map(Entity::from_value)
        .find(|todo| todo.title == title)
        .map(|todo| todo.id))
}

fn create(client: &ApiClient, path: &str, body: &Value, context: &str) -> Result<String, Failure> {
    let response = client.post_json(path, body)?;
    expect_status(&response, 201, context)?;
    response
        .id()
        .ok_or_else(|| Failure::assertion(format!("{context}: response has no 'id' field")))
}
