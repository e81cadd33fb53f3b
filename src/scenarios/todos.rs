use serde_json::json;

use super::{deleted_todo_id, numeric_id, with_todo};
use crate::domain::Entity;
use crate::fixtures;
use crate::http::{JSON_CONTENT_TYPE, XML_CONTENT_TYPE};
use crate::testing::assert::{
    DELETED, Failure, ensure, expect_empty_body, expect_status, expect_status_in, expect_status_not,
};
use crate::testing::scenario::{Scenario, ScenarioContext};

pub(super) fn scenarios() -> Vec<Scenario> {
    vec![
        scenario!(Todos, Documented, get_todos),
        scenario!(Todos, Documented, post_todos),
        scenario!(Todos, Documented, head_todos),
        scenario!(Todos, Documented, get_todos_id),
        scenario!(Todos, Documented, head_todos_id),
        scenario!(Todos, Documented, post_todos_id),
        scenario!(Todos, Documented, put_todos_id),
        scenario!(Todos, Documented, delete_todos_id),
        scenario!(Todos, Documented, get_todos_id_categories),
        scenario!(Todos, Documented, post_todos_id_categories),
        scenario!(Todos, Documented, head_todos_id_categories),
        scenario!(Todos, Documented, delete_todos_id_categories_id),
        scenario!(Todos, Documented, get_todos_not_found),
        scenario!(Todos, Documented, head_todos_not_found),
        scenario!(Todos, Documented, delete_todos_not_found),
        scenario!(Todos, Documented, delete_todos_id_tasksof_id),
        scenario!(Todos, Documented, head_todos_id_tasksof),
        scenario!(Todos, Documented, post_todos_id_tasksof),
        scenario!(Todos, Documented, get_todos_id_tasksof),
        scenario!(Todos, Undocumented, delete_todos),
        scenario!(Todos, Undocumented, put_todos),
        scenario!(Todos, Undocumented, patch_todos),
        scenario!(Todos, Undocumented, options_todos),
        scenario!(Todos, Undocumented, patch_todos_id),
        scenario!(Todos, Undocumented, options_todos_id),
        scenario!(Todos, Undocumented, put_todos_id_categories),
        scenario!(Todos, Undocumented, patch_todos_id_categories),
        scenario!(Todos, Undocumented, options_todos_id_categories),
        scenario!(Todos, Payloads, post_todos_malformed_json),
        scenario!(Todos, Payloads, post_todos_malformed_xml),
        scenario!(Todos, Payloads, post_todos_id_categories_valid_xml),
        scenario!(Todos, Payloads, post_todos_id_categories_invalid_xml),
        scenario!(Todos, Unexpected, post_todos_id_categories_id_generation),
        scenario!(Todos, Unexpected, get_todos_incorrect_categories),
        scenario!(Todos, Unexpected, get_todos_invalid_id_categories),
        scenario!(Todos, Unexpected, post_todos_id_categories_with_different_id_formats),
        scenario!(Todos, Unexpected, get_todos_incorrect_categories_observed),
        scenario!(Todos, Unexpected, get_todos_invalid_id_categories_observed),
        scenario!(Todos, Unexpected, post_todos_id_categories_with_string_id_observed),
    ]
}

fn first_todo(ctx: &ScenarioContext<'_>, id: &str) -> Result<Entity, Failure> {
    let response = ctx.client().get(&format!("/todos/{id}"))?;
    expect_status(&response, 200, &format!("Failed to fetch todo with id {id}"))?;
    response
        .items("todos")
        .first()
        .and_then(Entity::from_value)
        .ok_or_else(|| Failure::assertion(format!("GET /todos/{id} returned no todo")))
}

fn linked_ids(ctx: &ScenarioContext<'_>, path: &str, key: &str) -> Result<Vec<String>, Failure> {
    let response = ctx.client().get(path)?;
    expect_status(&response, 200, &format!("Failed to fetch {path}"))?;
    Ok(response
        .items(key)
        .iter()
        .filter_map(Entity::from_value)
        .map(|entity| entity.id)
        .collect())
}

// documented

fn get_todos(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Test Todo for GET", "Test description for GET", |ctx, id| {
        let ids = linked_ids(ctx, "/todos", "todos")?;
        ensure(
            ids.iter().any(|listed| listed == id),
            "Newly created todo not found in GET response",
        )
    })
}

fn post_todos(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Test Todo", "Test description", |ctx, id| {
        let todo = first_todo(ctx, id)?;
        ensure(todo.title == "Test Todo", "Title does not match expected value")?;
        ensure(
            todo.description == "Test description",
            "Description does not match expected value",
        )
    })
}

fn head_todos(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let response = ctx.client().head("/todos")?;
    expect_status(&response, 200, "HEAD /todos failed")?;
    expect_empty_body(&response, "HEAD /todos")
}

fn get_todos_id(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Test Todo", "Test description", |ctx, id| {
        let todo = first_todo(ctx, id)?;
        ensure(
            todo.title == "Test Todo",
            "Fetched todo title does not match expected value",
        )?;
        ensure(
            todo.description == "Test description",
            "Fetched todo description does not match expected value",
        )
    })
}

fn head_todos_id(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Test Todo", "Test description", |ctx, id| {
        let response = ctx.client().head(&format!("/todos/{id}"))?;
        expect_status(&response, 200, &format!("HEAD /todos/{id} failed"))?;
        expect_empty_body(&response, &format!("HEAD /todos/{id}"))
    })
}

fn post_todos_id(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Test Todo", "Test description", |ctx, id| {
        let update = json!({"title": "Updated Title", "description": "Updated description"});
        let response = ctx.client().post_json(&format!("/todos/{id}"), &update)?;
        expect_status_in(&response, &[200, 204], &format!("POST /todos/{id} failed"))?;

        let todo = first_todo(ctx, id)?;
        ensure(
            todo.title == "Updated Title",
            "POST request did not update the title correctly",
        )?;
        ensure(
            todo.description == "Updated description",
            "POST request did not update the description correctly",
        )
    })
}

fn put_todos_id(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Test Todo", "Test description", |ctx, id| {
        let update = json!({"title": "Updated Title", "description": "Updated description"});
        let response = ctx.client().put_json(&format!("/todos/{id}"), &update)?;
        expect_status_in(&response, &[200, 204], &format!("PUT /todos/{id} failed"))?;

        let todo = first_todo(ctx, id)?;
        ensure(todo.title == "Updated Title", "Title was not updated correctly")?;
        ensure(
            todo.description == "Updated description",
            "Description was not updated correctly",
        )
    })
}

fn delete_todos_id(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let id = fixtures::create_todo(ctx.client(), "Test Todo", "Test description")?;
    let response = ctx.client().delete(&format!("/todos/{id}"))?;
    expect_status_in(&response, DELETED, &format!("DELETE /todos/{id} failed"))?;

    let response = ctx.client().get(&format!("/todos/{id}"))?;
    expect_status(
        &response,
        404,
        &format!("Deleted todo with id {id} still exists"),
    )
}

fn get_todos_id_categories(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Test Todo", "Test description", |ctx, id| {
        let category = fixtures::create_category_for_todo(ctx.client(), id, "Linked Category")?;
        let listed = (|| -> Result<(), Failure> {
            let response = ctx.client().get(&format!("/todos/{id}/categories"))?;
            expect_status(&response, 200, &format!("GET /todos/{id}/categories failed"))?;
            let body = response.json()?;
            ensure(
                body.get("categories").is_some(),
                "Expected 'categories' key in response",
            )?;
            let ids = linked_ids(ctx, &format!("/todos/{id}/categories"), "categories")?;
            ensure(
                ids.contains(&category),
                format!("Category {category} not listed for todo {id}"),
            )
        })();
        listed.and(fixtures::delete_category(ctx.client(), &category))
    })
}

fn post_todos_id_categories(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Test Todo", "Test description", |ctx, id| {
        let category = fixtures::create_category(ctx.client(), "Test Category", "")?;
        let linked = (|| -> Result<(), Failure> {
            let response = ctx
                .client()
                .post_json(&format!("/todos/{id}/categories"), &json!({"id": category}))?;
            expect_status(&response, 201, &format!("POST /todos/{id}/categories failed"))?;
            let ids = linked_ids(ctx, &format!("/todos/{id}/categories"), "categories")?;
            ensure(
                ids.contains(&category),
                "Category not linked to todo as expected",
            )
        })();
        linked.and(fixtures::delete_category(ctx.client(), &category))
    })
}

fn head_todos_id_categories(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Test Todo", "Test description", |ctx, id| {
        let response = ctx.client().head(&format!("/todos/{id}/categories"))?;
        expect_status(&response, 200, &format!("HEAD /todos/{id}/categories failed"))?;
        expect_empty_body(&response, &format!("HEAD /todos/{id}/categories"))
    })
}

fn delete_todos_id_categories_id(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Test Todo", "Test description", |ctx, id| {
        let category = fixtures::create_category(ctx.client(), "Test Category", "")?;
        let unlinked = (|| -> Result<(), Failure> {
            ctx.client()
                .post_json(&format!("/todos/{id}/categories"), &json!({"id": category}))?;
            let path = format!("/todos/{id}/categories/{category}");
            let response = ctx.client().delete(&path)?;
            expect_status_in(&response, DELETED, &format!("DELETE {path} failed"))?;
            let ids = linked_ids(ctx, &format!("/todos/{id}/categories"), "categories")?;
            ensure(
                !ids.contains(&category),
                "Category still linked to todo after deletion",
            )
        })();
        unlinked.and(fixtures::delete_category(ctx.client(), &category))
    })
}

fn get_todos_not_found(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let response = ctx.client().get("/todos/10000")?;
    expect_status(&response, 404, "GET /todos/10000 did not return 404 as expected")
}

fn head_todos_not_found(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let response = ctx.client().head("/todos/10000")?;
    expect_status(&response, 404, "HEAD /todos/10000 did not return 404 as expected")
}

fn delete_todos_not_found(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let response = ctx.client().delete("/todos/10000")?;
    expect_status(&response, 404, "DELETE /todos/10000 did not return 404 as expected")
}

fn delete_todos_id_tasksof_id(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Test Todo", "Test description", |ctx, id| {
        let task = fixtures::create_task_of_todo(ctx.client(), id, "New Task1", "Task description")?;
        let unlinked = (|| -> Result<(), Failure> {
            let tasks_path = format!("/todos/{id}/tasksof");
            let ids = linked_ids(ctx, &tasks_path, "projects")?;
            ensure(
                ids.contains(&task),
                format!("Task with id {task} not linked to todo {id} as expected"),
            )?;

            let path = format!("{tasks_path}/{task}");
            let response = ctx.client().delete(&path)?;
            expect_status_in(&response, DELETED, &format!("DELETE {path} failed"))?;

            let ids = linked_ids(ctx, &tasks_path, "projects")?;
            ensure(
                !ids.contains(&task),
                format!("Task with id {task} still linked to todo {id}"),
            )
        })();
        unlinked.and(fixtures::delete_project(ctx.client(), &task))
    })
}

fn head_todos_id_tasksof(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Test Todo", "Test description", |ctx, id| {
        let response = ctx.client().head(&format!("/todos/{id}/tasksof"))?;
        expect_status(&response, 200, &format!("HEAD /todos/{id}/tasksof failed"))
    })
}

fn post_todos_id_tasksof(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Test Todo", "Test description", |ctx, id| {
        let task = fixtures::create_task_of_todo(ctx.client(), id, "New Task2", "Task description")?;
        let linked = linked_ids(ctx, &format!("/todos/{id}/tasksof"), "projects").and_then(|ids| {
            ensure(
                ids.contains(&task),
                format!("Task with id {task} not found in todo {id}"),
            )
        });
        linked.and(fixtures::delete_project(ctx.client(), &task))
    })
}

fn get_todos_id_tasksof(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Test Todo", "Test description", |ctx, id| {
        let response = ctx.client().get(&format!("/todos/{id}/tasksof"))?;
        expect_status(&response, 200, &format!("GET /todos/{id}/tasksof failed"))?;
        let body = response.json()?;
        ensure(
            body.get("projects").is_some(),
            "Expected 'projects' key in response",
        )
    })
}

// undocumented

fn delete_todos(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let response = ctx.client().delete("/todos")?;
    expect_status(&response, 405, "DELETE /todos failed with unexpected status code")
}

fn put_todos(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let body = json!({"title": "updated_title", "description": "updated_description"});
    let response = ctx.client().put_json("/todos", &body)?;
    expect_status(&response, 405, "PUT /todos failed with unexpected status code")
}

fn patch_todos(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let response = ctx.client().patch_json("/todos", &json!({"title": "updated_title"}))?;
    expect_status(&response, 405, "PATCH /todos failed with unexpected status code")
}

fn options_todos(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let response = ctx.client().options("/todos")?;
    expect_status(&response, 200, "OPTIONS /todos failed with unexpected status code")?;
    expect_empty_body(&response, "OPTIONS /todos")
}

fn patch_todos_id(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Default Title", "Default Description", |ctx, id| {
        let response = ctx
            .client()
            .patch_json(&format!("/todos/{id}"), &json!({"title": "patched_title"}))?;
        expect_status(
            &response,
            405,
            &format!("PATCH /todos/{id} failed with unexpected status code"),
        )
    })
}

fn options_todos_id(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Default Title", "Default Description", |ctx, id| {
        let response = ctx.client().options(&format!("/todos/{id}"))?;
        expect_status(
            &response,
            200,
            &format!("OPTIONS /todos/{id} failed with unexpected status code"),
        )?;
        expect_empty_body(&response, &format!("OPTIONS /todos/{id}"))
    })
}

fn put_todos_id_categories(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Default Title", "Default Description", |ctx, id| {
        let response = ctx
            .client()
            .put_json(&format!("/todos/{id}/categories"), &json!({"title": "updated_category"}))?;
        expect_status(
            &response,
            405,
            &format!("PUT /todos/{id}/categories failed with unexpected status code"),
        )
    })
}

fn patch_todos_id_categories(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Default Title", "Default Description", |ctx, id| {
        let response = ctx
            .client()
            .patch_json(&format!("/todos/{id}/categories"), &json!({"title": "patched_category"}))?;
        expect_status(
            &response,
            405,
            &format!("PATCH /todos/{id}/categories failed with unexpected status code"),
        )
    })
}

fn options_todos_id_categories(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "Default Title", "Default Description", |ctx, id| {
        let path = format!("/todos/{id}/categories");
        let response = ctx.client().options(&path)?;
        expect_status(
            &response,
            200,
            &format!("OPTIONS {path} failed with unexpected status code"),
        )?;
        expect_empty_body(&response, &format!("OPTIONS {path}"))
    })
}

// payloads

fn post_todos_malformed_json(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let malformed = r#"{"title": "test_title", "description": "test_description""#;
    let response = ctx.client().post_raw("/todos", JSON_CONTENT_TYPE, malformed)?;
    expect_status(&response, 400, "POST /todos with malformed JSON")
}

fn post_todos_malformed_xml(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let malformed = "<todos>\n  <title>title\n</todos>";
    let response = ctx.client().post_raw("/todos", XML_CONTENT_TYPE, malformed)?;
    expect_status(&response, 400, "POST /todos with malformed XML")
}

fn post_todos_id_categories_valid_xml(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "test_title", "test_description", |ctx, id| {
        let valid = "<category>\n  <title>title</title>\n</category>";
        let response = ctx
            .client()
            .post_raw(&format!("/todos/{id}/categories"), XML_CONTENT_TYPE, valid)?;
        expect_status_in(
            &response,
            &[200, 201],
            &format!("POST /todos/{id}/categories with valid XML"),
        )?;
        match response.id() {
            Some(category) if response.status == 201 => fixtures::delete_category(ctx.client(), &category),
            _ => Ok(()),
        }
    })
}

fn post_todos_id_categories_invalid_xml(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "test_title", "test_description", |ctx, id| {
        let invalid = "<todos>\n  <id>10</id>\n</todos>";
        let response = ctx
            .client()
            .post_raw(&format!("/todos/{id}/categories"), XML_CONTENT_TYPE, invalid)?;
        expect_status(
            &response,
            400,
            &format!("POST /todos/{id}/categories with invalid XML"),
        )
    })
}

// unexpected

fn post_todos_id_categories_id_generation(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let id = fixtures::create_todo(ctx.client(), "New todos", "todos description")?;
    let deleted = ctx.client().delete(&format!("/todos/{id}"))?;

    let category = json!({
        "title": "First Category",
        "description": "Description for the first category",
    });
    let response = ctx
        .client()
        .post_json(&format!("/todos/{id}/categories"), &category)?;

    expect_status_in(&deleted, DELETED, &format!("DELETE /todos/{id} failed"))?;
    expect_status(
        &response,
        201,
        "Failed to create a category linked to the todo",
    )?;
    let category_id = response
        .id()
        .ok_or_else(|| Failure::assertion("category response has no 'id' field"))?;
    let numeric = numeric_id(&category_id)?;
    ctx.observe("category_id", numeric);
    fixtures::delete_category(ctx.client(), &category_id)?;
    ensure(numeric > 0, "Category ID should be greater than 0")
}

fn get_todos_incorrect_categories(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let id = deleted_todo_id(ctx, "Default Title")?;
    let response = ctx.client().get(&format!("/todos/{id}/categories"))?;
    expect_status(
        &response,
        404,
        &format!("GET /todos/{id}/categories for a deleted todo"),
    )
}

fn get_todos_invalid_id_categories(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let response = ctx.client().get("/todos/anything/categories")?;
    expect_status(
        &response,
        404,
        "GET /todos/anything/categories for an invalid todo id",
    )
}

fn post_todos_id_categories_with_different_id_formats(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let id = deleted_todo_id(ctx, "New todos for Category Test")?;
    let path = format!("/todos/{id}/categories");

    let numeric = json!({
        "id": 15,
        "title": "Category with Numeric ID",
        "description": "Testing numeric ID input",
    });
    let response = ctx.client().post_json(&path, &numeric)?;
    expect_status_not(
        &response,
        201,
        "POST /todos/:id/categories should fail with a numeric ID",
    )?;

    let string = json!({
        "id": "15",
        "title": "Category with String ID",
        "description": "Testing string ID input",
    });
    let response = ctx.client().post_json(&path, &string)?;
    expect_status(
        &response,
        201,
        "POST /todos/:id/categories should succeed with a string ID",
    )
}

fn get_todos_incorrect_categories_observed(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let id = deleted_todo_id(ctx, "Default Title")?;
    let response = ctx.client().get(&format!("/todos/{id}/categories"))?;
    ctx.observe("status", response.status);
    expect_status_in(
        &response,
        &[404, 200],
        &format!("GET /todos/{id}/categories for a deleted todo"),
    )
}

fn get_todos_invalid_id_categories_observed(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let response = ctx.client().get("/todos/anything/categories")?;
    ctx.observe("status", response.status);
    expect_status_in(
        &response,
        &[404, 200],
        "GET /todos/anything/categories for an invalid todo id",
    )
}

/// Tolerates any answer; the status is what this probe is for.
fn post_todos_id_categories_with_string_id_observed(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_todo(ctx, "New todos for Category Test", "", |ctx, id| {
        let string = json!({
            "id": "15",
            "title": "Category with String ID",
            "description": "Testing string ID input",
        });
        let response = ctx
            .client()
            .post_json(&format!("/todos/{id}/categories"), &string)?;
        ctx.observe("status", response.status);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Collection;
    use crate::http::ApiClient;
    use crate::http::fake::InMemoryService;
    use pretty_assertions::assert_eq;

    fn context() -> (InMemoryService, ApiClient) {
        let service = InMemoryService::new();
        let client = ApiClient::with_transport(service.clone());
        (service, client)
    }

    #[test]
    fn post_todos_leaves_no_todo_behind() {
        let (service, client) = context();
        service.seed(Collection::Todos, json!({"title": "scan paperwork"}));
        let mut ctx = ScenarioContext::new(&client);

        post_todos(&mut ctx).unwrap();

        assert_eq!(service.titles(Collection::Todos), vec!["scan paperwork".to_string()]);
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        let (_service, client) = context();
        let mut ctx = ScenarioContext::new(&client);

        post_todos_malformed_json(&mut ctx).unwrap();
        post_todos_malformed_xml(&mut ctx).unwrap();
        post_todos_id_categories_invalid_xml(&mut ctx).unwrap();
    }

    #[test]
    fn valid_xml_is_reported_when_rejected() {
        let (service, client) = context();
        let mut ctx = ScenarioContext::new(&client);

        let err = post_todos_id_categories_valid_xml(&mut ctx).unwrap_err();

        assert!(err.to_string().contains("expected status in [200, 201], got 400"));
        assert!(service.titles(Collection::Todos).is_empty());
    }

    #[test]
    fn category_for_a_deleted_todo_is_not_found() {
        let (_service, client) = context();
        let mut ctx = ScenarioContext::new(&client);

        get_todos_incorrect_categories(&mut ctx).unwrap();
        let err = post_todos_id_categories_id_generation(&mut ctx).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to create a category linked to the todo: expected status 201, got 404"
        );
    }

    #[test]
    fn string_id_probe_records_status() {
        let (_service, client) = context();
        let mut ctx = ScenarioContext::new(&client);

        post_todos_id_categories_with_string_id_observed(&mut ctx).unwrap();

        let observations = ctx.into_observations();
        assert_eq!(observations[0].to_string(), "status = 201");
    }
}
