use serde_json::json;

use super::{deleted_project_id, numeric_id, with_project};
use crate::fixtures;
use crate::http::{JSON_CONTENT_TYPE, XML_CONTENT_TYPE};
use crate::testing::assert::{DELETED, Failure, ensure, expect_status, expect_status_in, expect_status_not};
use crate::testing::scenario::{Scenario, ScenarioContext};

pub(super) fn scenarios() -> Vec<Scenario> {
    vec![
        scenario!(Projects, Documented, get_projects),
        scenario!(Projects, Documented, post_projects),
        scenario!(Projects, Documented, head_projects),
        scenario!(Projects, Documented, get_projects_id),
        scenario!(Projects, Documented, put_projects_id),
        scenario!(Projects, Documented, delete_projects_id),
        scenario!(Projects, Documented, post_projects_id_categories),
        scenario!(Projects, Documented, get_projects_id_categories),
        scenario!(Projects, Documented, post_projects_id_tasks),
        scenario!(Projects, Documented, get_projects_id_tasks),
        scenario!(Projects, Documented, delete_projects_id_tasks_id),
        scenario!(Projects, Undocumented, delete_projects),
        scenario!(Projects, Undocumented, patch_projects),
        scenario!(Projects, Undocumented, options_projects),
        scenario!(Projects, Undocumented, patch_projects_id),
        scenario!(Projects, Undocumented, options_projects_id),
        scenario!(Projects, Undocumented, put_projects_id_categories),
        scenario!(Projects, Undocumented, patch_projects_id_categories),
        scenario!(Projects, Undocumented, options_projects_id_categories),
        scenario!(Projects, Payloads, post_projects_malformed_json),
        scenario!(Projects, Payloads, post_projects_malformed_xml),
        scenario!(Projects, Payloads, post_projects_invalid_xml),
        scenario!(Projects, Payloads, post_projects_valid_xml),
        scenario!(Projects, Unexpected, post_projects_id_categories_id_generation),
        scenario!(Projects, Unexpected, get_projects_incorrect_categories),
        scenario!(Projects, Unexpected, get_projects_invalid_id_categories),
        scenario!(Projects, Unexpected, post_projects_id_categories_with_different_id_formats),
        scenario!(Projects, Unexpected, get_projects_incorrect_categories_observed),
        scenario!(Projects, Unexpected, get_projects_invalid_id_categories_observed),
        scenario!(Projects, Unexpected, post_projects_id_categories_with_different_id_formats_observed),
    ]
}

// documented

fn get_projects(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let response = ctx.client().get("/projects")?;
    expect_status(&response, 200, "GET /projects failed")
}

fn post_projects(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let body = json!({"title": "New Project", "description": "Project description"});
    let response = ctx.client().post_json("/projects", &body)?;
    expect_status(&response, 201, "POST /projects failed")?;
    match response.id() {
        Some(id) => fixtures::delete_project(ctx.client(), &id),
        None => Err(Failure::assertion("POST /projects: response has no 'id' field")),
    }
}

fn head_projects(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let response = ctx.client().head("/projects")?;
    expect_status(&response, 200, "HEAD /projects failed")
}

fn get_projects_id(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_project(ctx, "Project 1", "Description", |ctx, id| {
        let response = ctx.client().get(&format!("/projects/{id}"))?;
        expect_status(&response, 200, &format!("GET /projects/{id} failed"))
    })
}

fn put_projects_id(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_project(ctx, "Project 2", "Description", |ctx, id| {
        let update = json!({"title": "Updated Project 2", "description": "Updated description"});
        let response = ctx.client().put_json(&format!("/projects/{id}"), &update)?;
        expect_status_in(&response, &[200, 204], &format!("PUT /projects/{id} failed"))
    })
}

fn delete_projects_id(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let id = fixtures::create_project(ctx.client(), "Project 3", "Description")?;
    let response = ctx.client().delete(&format!("/projects/{id}"))?;
    expect_status_in(&response, DELETED, &format!("DELETE /projects/{id} failed"))
}

fn post_projects_id_categories(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_project(ctx, "Project 4", "Description", |ctx, id| {
        let category = fixtures::create_category_for_project(ctx.client(), id, "Category 1", "Category description")?;
        fixtures::delete_category(ctx.client(), &category)
    })
}

fn get_projects_id_categories(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_project(ctx, "Project 5", "Description", |ctx, id| {
        let response = ctx.client().get(&format!("/projects/{id}/categories"))?;
        expect_status(&response, 200, &format!("GET /projects/{id}/categories failed"))
    })
}

fn post_projects_id_tasks(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_project(ctx, "Project 6", "Description", |ctx, id| {
        let task = fixtures::create_task_for_project(ctx.client(), id, "Task 1", "Task description")?;
        fixtures::delete_todo(ctx.client(), &task)
    })
}

fn get_projects_id_tasks(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_project(ctx, "Project 7", "Description", |ctx, id| {
        let response = ctx.client().get(&format!("/projects/{id}/tasks"))?;
        expect_status(&response, 200, &format!("GET /projects/{id}/tasks failed"))
    })
}

fn delete_projects_id_tasks_id(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_project(ctx, "Project 8", "Description", |ctx, id| {
        let task = fixtures::create_task_for_project(ctx.client(), id, "Task to Delete", "Task description")?;
        let path = format!("/projects/{id}/tasks/{task}");
        let unlinked = ctx
            .client()
            .delete(&path)
            .map_err(Failure::from)
            .and_then(|response| expect_status_in(&response, DELETED, &format!("DELETE {path} failed")));
        unlinked.and(fixtures::delete_todo(ctx.client(), &task))
    })
}

// undocumented

fn delete_projects(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let response = ctx.client().delete("/projects")?;
    expect_status(&response, 405, "DELETE /projects should not be allowed")
}

fn patch_projects(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let response = ctx.client().patch_json("/projects", &json!({"title": "Patch Project"}))?;
    expect_status(&response, 405, "PATCH /projects should not be allowed")
}

fn options_projects(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let response = ctx.client().options("/projects")?;
    expect_status(&response, 200, "OPTIONS /projects failed")
}

fn patch_projects_id(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_project(ctx, "Patch Project", "", |ctx, id| {
        let response = ctx
            .client()
            .patch_json(&format!("/projects/{id}"), &json!({"title": "Patched Project"}))?;
        expect_status(&response, 405, &format!("PATCH /projects/{id} should not be allowed"))
    })
}

fn options_projects_id(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_project(ctx, "Options Project", "", |ctx, id| {
        let response = ctx.client().options(&format!("/projects/{id}"))?;
        expect_status(&response, 200, &format!("OPTIONS /projects/{id} failed"))
    })
}

fn put_projects_id_categories(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_project(ctx, "Default Project", "Default Description", |ctx, id| {
        let path = format!("/projects/{id}/categories");
        let response = ctx.client().put_json(&path, &json!({}))?;
        expect_status(&response, 405, &format!("PUT {path} should not be allowed"))
    })
}

fn patch_projects_id_categories(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_project(ctx, "Default Project", "Default Description", |ctx, id| {
        let path = format!("/projects/{id}/categories");
        let response = ctx.client().patch_json(&path, &json!({}))?;
        expect_status(&response, 405, &format!("PATCH {path} should not be allowed"))
    })
}

fn options_projects_id_categories(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_project(ctx, "Default Project", "Default Description", |ctx, id| {
        let path = format!("/projects/{id}/categories");
        let response = ctx.client().options(&path)?;
        expect_status(&response, 200, &format!("OPTIONS {path} failed"))
    })
}

// payloads

fn post_projects_malformed_json(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let malformed = r#"{"title": "test_title", "description": "test_description""#;
    let response = ctx.client().post_raw("/projects", JSON_CONTENT_TYPE, malformed)?;
    expect_status(&response, 400, "POST /projects with malformed json")
}

fn post_projects_malformed_xml(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let malformed = "<projects>\n  <title>title\n</projects>";
    let response = ctx.client().post_raw("/projects", XML_CONTENT_TYPE, malformed)?;
    expect_status(&response, 400, "POST /projects with malformed xml")
}

fn post_projects_invalid_xml(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let invalid = "<projects>\n  <id>10</id>\n</projects>";
    let response = ctx.client().post_raw("/projects", XML_CONTENT_TYPE, invalid)?;
    expect_status(&response, 400, "POST /projects with invalid XML")
}

fn post_projects_valid_xml(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let valid = "<project>\n  <title>Valid XML Title</title>\n  <description>Valid XML Description</description>\n</project>";
    let response = ctx.client().post_raw("/projects", XML_CONTENT_TYPE, valid)?;
    expect_status(&response, 201, "POST /projects with valid xml")?;
    match response.id() {
        Some(id) => fixtures::delete_project(ctx.client(), &id),
        None => Ok(()),
    }
}

// unexpected

/// Asserts ids grow within one project and records whether a second
/// project's categories continue that sequence or start again.
fn post_projects_id_categories_id_generation(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let client = ctx.client();
    let mut categories = Vec::new();

    let first_project = fixtures::create_project(client, "New Project for ID Test", "Project description for ID Test")?;
    let first = fixtures::create_category_for_project(
        client,
        &first_project,
        "First Category",
        "Description for the first category",
    )?;
    categories.push(first.clone());
    let second = fixtures::create_category_for_project(
        client,
        &first_project,
        "Second Category",
        "Description for the second category",
    )?;
    categories.push(second.clone());
    fixtures::delete_project(client, &first_project)?;

    let second_project = fixtures::create_project(client, "New Project for ID Test 2", "Another project for ID test")?;
    let outcome = (|| -> Result<(), Failure> {
        let third = fixtures::create_category_for_project(
            client,
            &second_project,
            "Third Category",
            "Description for the third category",
        )?;
        categories.push(third.clone());

        let (first, second, third) = (numeric_id(&first)?, numeric_id(&second)?, numeric_id(&third)?);
        ensure(first > 0, "Category ID should be greater than 0")?;
        ensure(second > first, "Category IDs should increment")?;
        let numbering = if third == 1 { "per-project" } else { "global" };
        ctx.observe("category_numbering", numbering);
        ctx.observe("third_category_id", third);
        Ok(())
    })();

    let cleanup = categories
        .iter()
        .try_for_each(|category| fixtures::delete_category(client, category))
        .and(fixtures::delete_project(client, &second_project));
    outcome.and(cleanup)
}

fn get_projects_incorrect_categories(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let id = deleted_project_id(ctx)?;
    let response = ctx.client().get(&format!("/projects/{id}/categories"))?;
    expect_status(
        &response,
        404,
        &format!("GET /projects/{id}/categories for a deleted project"),
    )
}

fn get_projects_invalid_id_categories(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let response = ctx.client().get("/projects/anything/categories")?;
    expect_status(
        &response,
        404,
        "GET /projects/anything/categories for an invalid project id",
    )
}

fn post_projects_id_categories_with_different_id_formats(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    with_project(ctx, "New Project for Category Test", "Default Description", |ctx, id| {
        let path = format!("/projects/{id}/categories");
        let numeric = json!({
            "id": 15,
            "title": "Category with Numeric ID",
            "description": "Testing numeric ID input",
        });
        let response = ctx.client().post_json(&path, &numeric)?;
        expect_status_not(
            &response,
            201,
            "POST /projects/:id/categories should fail with a numeric ID",
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
            "POST /projects/:id/categories should succeed with a string ID",
        )
    })
}

fn get_projects_incorrect_categories_observed(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let id = deleted_project_id(ctx)?;
    let response = ctx.client().get(&format!("/projects/{id}/categories"))?;
    ctx.observe("status", response.status);
    expect_status_in(
        &response,
        &[404, 200],
        &format!("GET /projects/{id}/categories for a deleted project"),
    )
}

fn get_projects_invalid_id_categories_observed(ctx: &mut ScenarioContext<'_>) -> Result<(), Failure> {
    let response = ctx.client().get("/projects/anything/categories")?;
    ctx.observe("status", response.status);
    expect_status_in(
        &response,
        &[404, 200],
        "GET /projects/anything/categories for an invalid project id",
    )
}

fn post_projects_id_categories_with_different_id_formats_observed(
    ctx: &mut ScenarioContext<'_>,
) -> Result<(), Failure> {
    with_project(ctx, "New Project for Category Test", "Default Description", |ctx, id| {
        let path = format!("/projects/{id}/categories");
        let numeric = ctx.client().post_json(
            &path,
            &json!({"id": 15, "title": "Category with Numeric ID", "description": "Testing numeric ID input"}),
        )?;
        ctx.observe("numeric_id_status", numeric.status);
        let string = ctx.client().post_json(
            &path,
            &json!({"id": "15", "title": "Category with String ID", "description": "Testing string ID input"}),
        )?;
        ctx.observe("string_id_status", string.status);
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
    fn id_generation_records_numbering_and_cleans_up() {
        let (service, client) = context();
        let mut ctx = ScenarioContext::new(&client);

        post_projects_id_categories_id_generation(&mut ctx).unwrap();

        let observations: Vec<String> = ctx.into_observations().iter().map(ToString::to_string).collect();
        assert_eq!(observations, vec!["category_numbering = global", "third_category_id = 3"]);
        assert!(service.titles(Collection::Projects).is_empty());
        assert!(service.titles(Collection::Categories).is_empty());
    }

    #[test]
    fn numeric_id_is_rejected_and_string_id_accepted() {
        let (_service, client) = context();
        let mut ctx = ScenarioContext::new(&client);

        post_projects_id_categories_with_different_id_formats(&mut ctx).unwrap();
        post_projects_id_categories_with_different_id_formats_observed(&mut ctx).unwrap();

        let observations: Vec<String> = ctx.into_observations().iter().map(ToString::to_string).collect();
        assert_eq!(observations, vec!["numeric_id_status = 400", "string_id_status = 201"]);
    }

    #[test]
    fn deleted_and_invalid_parents_are_not_found() {
        let (_service, client) = context();
        let mut ctx = ScenarioContext::new(&client);

        get_projects_incorrect_categories(&mut ctx).unwrap();
        get_projects_invalid_id_categories(&mut ctx).unwrap();
    }

    #[test]
    fn task_scenarios_remove_their_todos() {
        let (service, client) = context();
        let mut ctx = ScenarioContext::new(&client);

        post_projects_id_tasks(&mut ctx).unwrap();
        delete_projects_id_tasks_id(&mut ctx).unwrap();

        assert!(service.titles(Collection::Todos).is_empty());
        assert!(service.titles(Collection::Projects).is_empty());
    }
}
