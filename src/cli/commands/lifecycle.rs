//! Device commands: create, read, update, delete, import
//!
//! Each command prints the resulting state as YAML (or one JSON document)
//! followed by any warnings the transaction collected.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;

use super::{read_document, timestamp, CommandContext, ResourceFileArgs};
use junos_provider::diagnostics::{Diagnostic, Outcome};

/// Arguments for update command
#[derive(Parser, Debug, Clone)]
pub struct UpdateArgs {
    /// Resource type
    pub resource: String,

    /// Current state file
    pub prior: PathBuf,

    /// Desired configuration file
    pub file: PathBuf,
}

/// Arguments for import command
#[derive(Parser, Debug, Clone)]
pub struct ImportArgs {
    /// Resource type
    pub resource: String,

    /// Import identifier, parts joined with `_-_`
    pub id: String,
}

impl ResourceFileArgs {
    pub async fn create(&self, ctx: &CommandContext) -> Result<i32> {
        let resource = ctx.resource(&self.resource)?;
        let config = read_document(&self.file)?;
        let provider = ctx.provider()?;

        let outcome = resource.create(&provider, &config).await;
        Ok(finish(ctx, "create", resource.type_name(), outcome, |state| {
            format!("Created {}", state_id(state))
        }))
    }

    pub async fn read(&self, ctx: &CommandContext) -> Result<i32> {
        let resource = ctx.resource(&self.resource)?;
        let state = read_document(&self.file)?;
        let provider = ctx.provider()?;

        let outcome = resource.read(&provider, &state).await;
        Ok(finish(ctx, "read", resource.type_name(), outcome, |state| match state {
            Some(state) => format!("Read {}", state_id(state)),
            None => "Resource no longer exists".to_string(),
        }))
    }

    pub async fn delete(&self, ctx: &CommandContext) -> Result<i32> {
        let resource = ctx.resource(&self.resource)?;
        let state = read_document(&self.file)?;
        let provider = ctx.provider()?;

        let outcome = resource.delete(&provider, &state).await;
        Ok(finish(ctx, "delete", resource.type_name(), outcome, |_| {
            format!("Deleted {}", state_id(&state))
        }))
    }
}

impl UpdateArgs {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let resource = ctx.resource(&self.resource)?;
        let prior = read_document(&self.prior)?;
        let config = read_document(&self.file)?;
        let provider = ctx.provider()?;

        let outcome = resource.update(&provider, &prior, &config).await;
        Ok(finish(ctx, "update", resource.type_name(), outcome, |state| {
            format!("Updated {}", state_id(state))
        }))
    }
}

impl ImportArgs {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let resource = ctx.resource(&self.resource)?;
        let provider = ctx.provider()?;

        let outcome = resource.import(&provider, &self.id).await;
        Ok(finish(ctx, "import", resource.type_name(), outcome, |state| {
            format!("Imported {}", state_id(state))
        }))
    }
}

/// Report an operation outcome and return the exit code
fn finish<T: Serialize>(
    ctx: &CommandContext,
    operation: &str,
    resource: &str,
    outcome: Outcome<T>,
    describe: impl FnOnce(&T) -> String,
) -> i32 {
    let Outcome { result, warnings } = outcome;
    let mut diagnostics = warnings;

    let (state, code) = match result {
        Ok(value) => {
            let state = serde_json::to_value(&value).unwrap_or(Value::Null);
            if !state.is_null() {
                ctx.output.document(&state);
            }
            ctx.show_memory();
            ctx.output.diagnostics(&diagnostics);
            ctx.output.done(&describe(&value));
            (state, 0)
        }
        Err(err) => {
            diagnostics.push(Diagnostic::from(&err));
            ctx.output.diagnostics(&diagnostics);
            (Value::Null, 1)
        }
    };

    ctx.output.json(&json!({
        "resource": resource,
        "operation": operation,
        "success": code == 0,
        "state": state,
        "diagnostics": diagnostics,
        "timestamp": timestamp(),
    }));
    code
}

fn state_id(state: &Value) -> &str {
    state.get("id").and_then(Value::as_str).unwrap_or("")
}
