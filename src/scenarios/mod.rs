//! # Scenario Catalogue
//!
//! Black-box probes of the todo manager, one function per behaviour, grouped
//! by resource and by how the behaviour relates to the service documentation.
//! Each scenario creates what it needs and removes it again; anything a
//! scenario cannot clean up is left to run-level restore.

use crate::fixtures;
use crate::testing::assert::Failure;
use crate::testing::scenario::{Group, Resource, Scenario, ScenarioContext};

macro_rules! scenario {
    ($resource:ident, $group:ident, $run:ident) => {
        $crate::testing::scenario::Scenario {
            name: stringify!($run),
            resource: $crate::testing::scenario::Resource::$resource,
            group: $crate::testing::scenario::Group::$group,
            run: $run,
        }
    };
}

mod projects;
mod todos;

/// Every known scenario, todos first.
pub fn catalogue() -> Vec<Scenario> {
    let mut all = todos::scenarios();
    all.extend(projects::scenarios());
    all
}

/// Scenarios matching every given criterion. `filter` is a substring of the
/// scenario name.
pub fn select(resource: Option<Resource>, group: Option<Group>, filter: Option<&str>) -> Vec<Scenario> {
    catalogue()
        .into_iter()
        .filter(|scenario| resource.is_none_or(|resource| scenario.resource == resource))
        .filter(|scenario| group.is_none_or(|group| scenario.group == group))
        .filter(|scenario| filter.is_none_or(|filter| scenario.name.contains(filter)))
        .collect()
}

/// Runs `body` against a fresh todo and deletes it afterwards. A failure in
/// `body` takes precedence over a failed cleanup.
fn with_todo<F>(ctx: &mut ScenarioContext<'_>, title: &str, description: &str, body: F) -> Result<(), Failure>
where
    F: FnOnce(&mut ScenarioContext<'_>, &str) -> Result<(), Failure>,
{
    let id = fixtures::create_todo(ctx.client(), title, description)?;
    let outcome = body(ctx, &id);
    let cleanup = fixtures::delete_todo(ctx.client(), &id);
    outcome.and(cleanup)
}

fn with_project<F>(ctx: &mut ScenarioContext<'_>, title: &str, description: &str, body: F) -> Result<(), Failure>
where
    F: FnOnce(&mut ScenarioContext<'_>, &str) -> Result<(), Failure>,
{
    let id = fixtures::create_project(ctx.client(), title, description)?;
    let outcome = body(ctx, &id);
    let cleanup = fixtures::delete_project(ctx.client(), &id);
    outcome.and(cleanup)
}

/// Numeric value of a service-assigned id.
fn numeric_id(id: &str) -> Result<u64, Failure> {
    id.parse()
        .map_err(|_| Failure::assertion(format!("id '{id}' is not numeric")))
}

/// Creates then deletes a todo, handing back an id that no longer exists.
fn deleted_todo_id(ctx: &ScenarioContext<'_>, title: &str) -> Result<String, Failure> {
    let id = fixtures::create_todo(ctx.client(), title, "Default Description")?;
    fixtures::delete_todo(ctx.client(), &id)?;
    Ok(id)
}

fn deleted_project_id(ctx: &ScenarioContext<'_>) -> Result<String, Failure> {
    let id = fixtures::create_project(ctx.client(), "Default Project", "Default Description")?;
    fixtures::delete_project(ctx.client(), &id)?;
    Ok(id)
}
