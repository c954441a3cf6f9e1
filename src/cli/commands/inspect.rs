//! Offline commands: resources, validate, render, plan

use anyhow::Result;
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;

use super::{read_document, timestamp, CommandContext, ResourceFileArgs};
use crate::cli::diff::ConfigDiff;
use junos_provider::engine::Provider;
use junos_provider::session::MemoryDevice;

/// Arguments for plan command
#[derive(Parser, Debug, Clone)]
pub struct PlanArgs {
    /// Resource type
    pub resource: String,

    /// Current state file
    pub prior: PathBuf,

    /// Desired configuration file
    pub file: PathBuf,
}

/// List resource types
pub fn resources(ctx: &CommandContext) -> Result<i32> {
    let types: Vec<_> = ctx
        .registry
        .names()
        .filter_map(|name| ctx.registry.get(name).ok())
        .map(|resource| (resource.type_name(), resource.id_format()))
        .collect();

    ctx.output.json(&json!({
        "resources": types
            .iter()
            .map(|(name, id)| json!({"name": name, "id_format": id}))
            .collect::<Vec<_>>(),
    }));

    if !ctx.output.is_json() {
        for (name, id) in &types {
            println!("{:<28} {}", name, id);
        }
    }
    Ok(0)
}

impl ResourceFileArgs {
    /// Check a configuration and report every problem
    pub fn validate(&self, ctx: &CommandContext) -> Result<i32> {
        let resource = ctx.resource(&self.resource)?;
        let config = read_document(&self.file)?;
        let diagnostics = resource.validate(&config)?;
        let all: Vec<_> = diagnostics.iter().cloned().collect();
        let report = ctx.report(&all);

        ctx.output.json(&json!({
            "resource": resource.type_name(),
            "valid": !diagnostics.has_errors(),
            "diagnostics": report,
            "timestamp": timestamp(),
        }));

        if diagnostics.has_errors() {
            return Ok(1);
        }
        ctx.output.done("Configuration is valid");
        Ok(0)
    }

    /// Print the `set` lines of a configuration
    pub fn render(&self, ctx: &CommandContext) -> Result<i32> {
        let resource = ctx.resource(&self.resource)?;
        let config = read_document(&self.file)?;
        let lines = resource.render(&config)?;

        ctx.output.json(&json!({
            "resource": resource.type_name(),
            "lines": lines,
        }));
        ctx.output.lines(&lines);
        Ok(0)
    }
}

impl PlanArgs {
    /// Print the lines an update would load and the change of `set` lines
    pub fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let resource = ctx.resource(&self.resource)?;
        let prior = read_document(&self.prior)?;
        let config = read_document(&self.file)?;

        // Planning never opens a session
        let provider = Provider::new(std::sync::Arc::new(MemoryDevice::new()));
        let lines = resource.plan(&provider, &prior, &config)?;
        let before = resource.render(&prior).unwrap_or_default();
        let after = resource.render(&config)?;

        let differ = ConfigDiff::new(ctx.output.use_color());
        let (added, removed) = differ.summary(&before, &after);

        ctx.output.json(&json!({
            "resource": resource.type_name(),
            "lines": lines,
            "added": added,
            "removed": removed,
        }));

        ctx.output.section("Lines to load");
        ctx.output.lines(&lines);
        if !ctx.output.is_json() {
            let diff = differ.unified(
                &before,
                &after,
                &self.prior.display().to_string(),
                &self.file.display().to_string(),
            );
            if diff.is_empty() {
                ctx.output.section("No changes");
            } else {
                ctx.output.section(&format!("Changes (+{} -{})", added, removed));
                print!("{}", diff);
            }
        }
        Ok(0)
    }
}
