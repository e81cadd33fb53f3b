//! Step definitions for the todo feature files.

use serde_json::json;

use super::context::StepContext;
use super::pattern::{PatternError, StepArgs};
use super::registry::{Keyword, StepRegistry};
use crate::domain::{Collection, Entity};
use crate::fixtures;
use crate::testing::assert::{Failure, ensure, expect_status};

const SEEDED_TITLES: [&str; 3] = ["Grocery Shopping", "Complete Homework", "Pay Bills"];
const MISSING_TODO: &str = "/todos/9999";

/// Registry with every step the bundled features use.
pub fn standard() -> Result<StepRegistry, PatternError> {
    let mut registry = StepRegistry::new();

    registry.register_probe(Keyword::Given, "the API is responsive", api_is_responsive)?;
    registry.register(Keyword::Given, "the database contains several todos", database_has_todos)?;
    registry.register(Keyword::Given, "the database is empty", database_is_empty)?;
    registry.register(
        Keyword::Given,
        "there is an existing todo with title '{todo_title}' in the database",
        existing_todo,
    )?;
    registry.register(
        Keyword::Given,
        "there is a second todo with title '{todo_title}' in the database",
        second_todo,
    )?;
    registry.register(
        Keyword::Given,
        "the todo with title '{todo_title}' already has categories '{first}' and '{second}'",
        todo_has_categories,
    )?;

    registry.register(Keyword::When, "the user retrieves all todos", retrieve_all)?;
    registry.register(
        Keyword::When,
        "the user attempts to retrieve a todo with id {todo_id:d}",
        retrieve_by_id,
    )?;
    registry.register(
        Keyword::When,
        "the user deletes the todo with title '{todo_title}'",
        delete_by_title,
    )?;
    registry.register(
        Keyword::When,
        "the user attempts to delete a todo with id {todo_id:d}",
        delete_by_id,
    )?;
    registry.register(
        Keyword::When,
        "the user posts the category '{category_title}' for the todo with title '{todo_title}'",
        post_category,
    )?;
    registry.register(
        Keyword::When,
        "the user attempts to post the category '{category_title}' for a non-existent todo",
        post_category_for_missing_todo,
    )?;
    registry.register(
        Keyword::When,
        "the user attempts to update a non-existent todo",
        update_missing_todo,
    )?;
    registry.register(
        Keyword::When,
        "the todo with title '{todo_title}' is updated with title '{new_title}', doneStatus '{done_status}', and description '{new_description}'",
        update_todo_fully,
    )?;
    registry.register(
        Keyword::When,
        "the todo with title '{todo_title}' is updated with title '{new_title}'",
        update_todo_title,
    )?;

    registry.register(Keyword::Then, "the status code {status_code:d} will be received", status_is)?;
    registry.register(Keyword::Then, "the response contains a list of todos", response_lists_todos)?;
    registry.register(
        Keyword::Then,
        "the todo with title \"{todo_title}\" is included in the list",
        title_is_listed,
    )?;
    registry.register(
        Keyword::Then,
        "the todo has new title '{new_title}', doneStatus '{done_status}' and new description '{new_description}'",
        todo_has_new_fields,
    )?;
    registry.register(Keyword::Then, "the todo has new title '{new_title}'", todo_has_new_title)?;
    registry.register(
        Keyword::Then,
        "only one todo with title '{todo_title}' should exist in the database",
        title_is_unique,
    )?;
    registry.register(Keyword::Then, "the response contains an empty list", response_is_empty)?;
    registry.register(
        Keyword::Then,
        "the todo with title '{todo_title}' should no longer exist in the database",
        title_is_gone,
    )?;
    registry.register(
        Keyword::Then,
        "an error message '{error_message}' will be displayed",
        error_message_shown,
    )?;
    registry.register(
        Keyword::Then,
        "the response contains categories '{category_titles}' for the todo with title '{todo_title}'",
        categories_are_linked,
    )?;

    Ok(registry)
}

fn todo_id_for(ctx: &StepContext<'_>, title: &str) -> Result<String, Failure> {
    fixtures::find_todo_id(ctx.client(), title)?
        .ok_or_else(|| Failure::assertion(format!("Todo with title '{title}' not found.")))
}

fn post_category_for(ctx: &mut StepContext<'_>, todo_title: &str, category_title: &str) -> Result<(), Failure> {
    let id = todo_id_for(ctx, todo_title)?;
    let response = ctx
        .client()
        .post_json(&format!("/todos/{id}/categories"), &json!({"title": category_title}))?;
    let outcome = expect_status(
        &response,
        201,
        &format!("Failed to post category '{category_title}' for todo '{todo_title}'"),
    );
    ctx.response = Some(response);
    outcome
}

/// Listing under `todos` in the stored response.
fn listed_todos(ctx: &StepContext<'_>) -> Result<Vec<Entity>, Failure> {
    let body = ctx.response()?.json()?;
    let todos = body
        .get("todos")
        .and_then(|todos| todos.as_array())
        .ok_or_else(|| Failure::assertion("Response does not contain 'todos' key"))?;
    Ok(todos.iter().filter_map(Entity::from_value).collect())
}

/// Re-reads the todo now titled `title` and stores that response.
fn reload_by_title(ctx: &mut StepContext<'_>, title: &str) -> Result<Entity, Failure> {
    let id = todo_id_for(ctx, title)?;
    let response = ctx.client().get(&format!("/todos/{id}"))?;
    expect_status(&response, 200, &format!("Failed to retrieve todo with id '{id}'"))?;
    let todo = response
        .items("todos")
        .first()
        .and_then(Entity::from_value)
        .ok_or_else(|| Failure::assertion(format!("GET /todos/{id} returned no todo")))?;
    ctx.response = Some(response);
    Ok(todo)
}

fn parse_flag(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true")
}

// given

/// Re-probes liveness. A dead API is not a failure: later steps soft-skip.
fn api_is_responsive(ctx: &mut StepContext<'_>, _: &StepArgs) -> Result<(), Failure> {
    ctx.api_is_running = match ctx.client().ensure_ready() {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!(%error, "API is not active, skipping remaining steps");
            false
        }
    };
    Ok(())
}

fn database_has_todos(ctx: &mut StepContext<'_>, _: &StepArgs) -> Result<(), Failure> {
    for title in SEEDED_TITLES {
        fixtures::create_todo(ctx.client(), title, &format!("Description for {title}"))
            .map_err(|failure| Failure::assertion(format!("Failed to create todo '{title}': {failure}")))?;
    }
    Ok(())
}

fn database_is_empty(ctx: &mut StepContext<'_>, _: &StepArgs) -> Result<(), Failure> {
    for todo in fixtures::list(ctx.client(), Collection::Todos)? {
        let response = ctx.client().delete(&format!("/todos/{}", todo.id))?;
        if response.status != 200 {
            tracing::debug!(id = %todo.id, status = response.status, "todo not deleted while emptying");
        }
    }
    Ok(())
}

/// Reuses a todo with that title when one exists, so the title stays unique.
fn existing_todo(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), Failure> {
    let title = args.text("todo_title")?;
    match fixtures::find_todo_id(ctx.client(), title)? {
        Some(_) => Ok(()),
        None => create_titled(ctx, title),
    }
}

fn second_todo(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), Failure> {
    create_titled(ctx, args.text("todo_title")?)
}

fn create_titled(ctx: &StepContext<'_>, title: &str) -> Result<(), Failure> {
    let response = ctx.client().post_json("/todos", &json!({"title": title}))?;
    expect_status(&response, 201, &format!("Failed to create todo with title '{title}'"))
}

fn todo_has_categories(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), Failure> {
    let title = args.text("todo_title")?;
    post_category_for(ctx, title, args.text("first")?)?;
    post_category_for(ctx, title, args.text("second")?)
}

// when

fn retrieve_all(ctx: &mut StepContext<'_>, _: &StepArgs) -> Result<(), Failure> {
    ctx.response = Some(ctx.client().get("/todos")?);
    Ok(())
}

fn retrieve_by_id(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), Failure> {
    let id = args.int("todo_id")?;
    ctx.response = Some(ctx.client().get(&format!("/todos/{id}"))?);
    Ok(())
}

fn delete_by_title(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), Failure> {
    let id = todo_id_for(ctx, args.text("todo_title")?)?;
    ctx.response = Some(ctx.client().delete(&format!("/todos/{id}"))?);
    Ok(())
}

fn delete_by_id(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), Failure> {
    let id = args.int("todo_id")?;
    ctx.response = Some(ctx.client().delete(&format!("/todos/{id}"))?);
    Ok(())
}

fn post_category(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), Failure> {
    post_category_for(ctx, args.text("todo_title")?, args.text("category_title")?)
}

fn post_category_for_missing_todo(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), Failure> {
    let body = json!({"title": args.text("category_title")?});
    ctx.response = Some(ctx.client().post_json(&format!("{MISSING_TODO}/categories"), &body)?);
    Ok(())
}

fn update_missing_todo(ctx: &mut StepContext<'_>, _: &StepArgs) -> Result<(), Failure> {
    ctx.response = Some(ctx.client().put_json(MISSING_TODO, &json!({"title": "title"}))?);
    Ok(())
}

fn update_todo_fully(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), Failure> {
    let body = json!({
        "title": args.text("new_title")?,
        "description": args.text("new_description")?,
        "doneStatus": parse_flag(args.text("done_status")?),
    });
    update_by_title(ctx, args.text("todo_title")?, &body)
}

fn update_todo_title(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), Failure> {
    let body = json!({"title": args.text("new_title")?});
    update_by_title(ctx, args.text("todo_title")?, &body)
}

fn update_by_title(ctx: &mut StepContext<'_>, title: &str, body: &serde_json::Value) -> Result<(), Failure> {
    let id = todo_id_for(ctx, title)?;
    let response = ctx.client().put_json(&format!("/todos/{id}"), body)?;
    let outcome = expect_status(&response, 200, &format!("Failed to update todo with id '{id}'"));
    ctx.response = Some(response);
    outcome
}

// then

fn status_is(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), Failure> {
    let expected = args.int("status_code")?;
    let actual = ctx.response()?.status;
    ensure(
        i64::from(actual) == expected,
        format!("Expected {expected}, but got {actual}"),
    )
}

fn response_lists_todos(ctx: &mut StepContext<'_>, _: &StepArgs) -> Result<(), Failure> {
    listed_todos(ctx).map(|_| ())
}

fn title_is_listed(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), Failure> {
    let title = args.text("todo_title")?;
    let todos = listed_todos(ctx)?;
    ensure(
        todos.iter().any(|todo| todo.title == title),
        format!("Todo with title '{title}' not found in response"),
    )
}

fn todo_has_new_fields(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), Failure> {
    let title = args.text("new_title")?;
    let done = args.text("done_status")?;
    let description = args.text("new_description")?;
    let todo = reload_by_title(ctx, title)?;

    ensure(
        todo.title == title,
        format!("Expected title '{title}', but got '{}'", todo.title),
    )?;
    let actual = todo.flag("doneStatus");
    ensure(
        actual == Some(parse_flag(done)),
        format!("Expected doneStatus '{done}', but got '{actual:?}'"),
    )?;
    ensure(
        todo.description == description,
        format!("Expected description '{description}', but got '{}'", todo.description),
    )
}

fn todo_has_new_title(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), Failure> {
    let title = args.text("new_title")?;
    let todo = reload_by_title(ctx, title)?;
    ensure(
        todo.title == title,
        format!("Expected title '{title}', but got '{}'", todo.title),
    )
}

fn title_is_unique(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), Failure> {
    let title = args.text("todo_title")?;
    let response = ctx.client().get("/todos")?;
    expect_status(&response, 200, "Failed to retrieve todos.")?;
    let count = response
        .items("todos")
        .iter()
        .filter_map(Entity::from_value)
        .filter(|todo| todo.title == title)
        .count();
    ensure(
        count == 1,
        format!("Expected exactly one todo with title '{title}', but found {count}."),
    )
}

fn response_is_empty(ctx: &mut StepContext<'_>, _: &StepArgs) -> Result<(), Failure> {
    let todos = listed_todos(ctx)?;
    ensure(
        todos.is_empty(),
        format!("Expected an empty list, but found {} todos", todos.len()),
    )
}

fn title_is_gone(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), Failure> {
    let title = args.text("todo_title")?;
    ensure(
        fixtures::find_todo_id(ctx.client(), title)?.is_none(),
        format!("Todo with title '{title}' still exists in the database."),
    )
}

fn error_message_shown(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), Failure> {
    let message = args.text("error_message")?;
    let body = &ctx.response()?.body;
    ensure(
        body.contains(message),
        format!("Expected error message '{message}' but got {body}"),
    )
}

/// `category_titles` is a comma-separated list; every title must be linked.
fn categories_are_linked(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), Failure> {
    let todo_title = args.text("todo_title")?;
    let id = todo_id_for(ctx, todo_title)?;
    let response = ctx.client().get(&format!("/todos/{id}/categories"))?;
    expect_status(
        &response,
        200,
        &format!("Failed to retrieve categories for todo with ID {id}."),
    )?;
    let linked: Vec<String> = response
        .items("categories")
        .iter()
        .filter_map(Entity::from_value)
        .map(|category| category.title)
        .collect();

    args.text("category_titles")?
        .split(',')
        .map(str::trim)
        .try_for_each(|expected| {
            ensure(
                linked.iter().any(|title| title == expected),
                format!("Category '{expected}' not found linked to todo '{todo_title}'."),
            )
        })
}
