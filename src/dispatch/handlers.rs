//! One handler per exposed tool
//!
//! Handlers marshal the string map into typed requests, run the boundary
//! sequence against the stores, and format the original's result texts.
//! Outbound masking happens once, in the dispatcher.

use crate::backup::Backup;
use crate::guard::ArgClass;
use crate::runner::RunOptions;
use crate::vars::VarScope;
use crate::workspace::ReadTarget;

use super::request::{checked_opt, AddHostRequest, PushConfigRequest, RunPlaybookRequest};
use super::{DispatchError, Services, ToolArgs};

type HandlerResult = Result<String, DispatchError>;

fn backup_note(backup: &Option<Backup>) -> String {
    match backup {
        Some(backup) => format!("\nBackup: {}", backup.file_name()),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// workspace structure and raw files

pub async fn show_structure(services: &Services, _args: ToolArgs) -> HandlerResult {
    Ok(services.files.structure())
}

pub async fn read_file(services: &Services, args: ToolArgs) -> HandlerResult {
    let path = args.require("file_path")?;
    services.sanitizer.check("file_path", path, ArgClass::PathArg)?;
    match services.files.read(path).await? {
        ReadTarget::File(content) => Ok(format!("=== FILE: {path} ===\n\n{content}")),
        ReadTarget::Directory(entries) => {
            let listing: Vec<String> = entries.iter().map(|e| format!("  - {e}")).collect();
            Ok(format!(
                "'{path}' is a directory containing:\n{}",
                listing.join("\n")
            ))
        }
    }
}

pub async fn write_file(services: &Services, args: ToolArgs) -> HandlerResult {
    let path = args.require("file_path")?;
    let content = args.require("content")?;
    services.sanitizer.check("file_path", path, ArgClass::PathArg)?;
    services.sanitizer.check("content", content, ArgClass::Body)?;
    let report = services.files.write(path, content).await?;
    Ok(format!(
        "SUCCESS: File written to {}{}",
        report.relative_path,
        backup_note(&report.backup)
    ))
}

pub async fn list_backups(services: &Services, args: ToolArgs) -> HandlerResult {
    let path = args.require("file_path")?;
    services.sanitizer.check("file_path", path, ArgClass::PathArg)?;
    let resolved = services.guard.resolve(path)?;
    let backups = services.backups.list_backups(&resolved).await?;
    if backups.is_empty() {
        return Ok(format!("No backups found for {path}"));
    }
    let names: Vec<String> = backups
        .iter()
        .filter_map(|b| b.file_name().map(|n| format!("  - {}", n.to_string_lossy())))
        .collect();
    Ok(format!("Backups of {path} (newest first):\n{}", names.join("\n")))
}

pub async fn restore_file(services: &Services, args: ToolArgs) -> HandlerResult {
    let path = args.require("file_path")?;
    services.sanitizer.check("file_path", path, ArgClass::PathArg)?;
    if !args.flag("confirm") {
        return Ok(format!(
            "WARNING: This will overwrite '{path}' with its newest backup. Set confirm=yes to proceed."
        ));
    }

    let resolved = services.guard.resolve(path)?;
    let backups = services.backups.list_backups(&resolved).await?;
    let Some(newest) = backups.first() else {
        return Ok(format!("ERROR: No backups found for {path}"));
    };
    let snapshot = tokio::fs::read_to_string(newest)
        .await
        .map_err(crate::workspace::WorkspaceError::from)?;
    // write() snapshots the live file first, so the restore is reversible
    let report = services.files.write(path, &snapshot).await?;
    Ok(format!(
        "SUCCESS: Restored {path} from {}{}",
        newest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        backup_note(&report.backup)
    ))
}

// ---------------------------------------------------------------------------
// inventory

pub async fn read_inventory(services: &Services, _args: ToolArgs) -> HandlerResult {
    let content = services.inventory.read().await?;
    Ok(format!("=== INVENTORY ===\n\n{content}"))
}

pub async fn write_inventory(services: &Services, args: ToolArgs) -> HandlerResult {
    let content = args.require("content")?;
    services.sanitizer.check("content", content, ArgClass::Body)?;
    let report = services.inventory.write(content).await?;
    match report.validation_warning {
        None => Ok(format!(
            "SUCCESS: Inventory updated{}",
            backup_note(&report.backup)
        )),
        Some(warning) => Ok(format!(
            "WARNING: Inventory written but validation failed:\n{warning}{}",
            backup_note(&report.backup)
        )),
    }
}

pub async fn add_host(services: &Services, args: ToolArgs) -> HandlerResult {
    let request = AddHostRequest::from_args(&services.sanitizer, &args)?;
    services
        .inventory
        .add_host(
            &request.group,
            &request.hostname,
            &request.address,
            request.extra_vars.as_deref(),
        )
        .await?;
    Ok(format!(
        "SUCCESS: Added host '{}' ({}) to group '{}'",
        request.hostname, request.address, request.group
    ))
}

pub async fn remove_host(services: &Services, args: ToolArgs) -> HandlerResult {
    let hostname = args.require("hostname")?;
    services.sanitizer.check("hostname", hostname, ArgClass::Name)?;
    if !args.flag("confirm") {
        return Ok(format!(
            "WARNING: This will remove '{hostname}' from the inventory. Set confirm=yes to proceed."
        ));
    }
    services.inventory.remove_host(hostname).await?;
    Ok(format!("SUCCESS: Removed host '{hostname}' from inventory"))
}

pub async fn list_inventory(services: &Services, _args: ToolArgs) -> HandlerResult {
    let summary = services.inventory.list().await?;
    let mut out = vec![
        "=== INVENTORY ===".to_string(),
        format!("Total hosts: {}", summary.total_hosts),
    ];
    if !summary.hosts.is_empty() {
        out.push(format!("Hosts: {}", summary.hosts.join(", ")));
    }
    if !summary.groups.is_empty() {
        out.push(format!("\nGroups ({}):", summary.groups.len()));
        for group in &summary.groups {
            out.push(format!("  [{}]: {}", group.name, group.hosts.join(", ")));
        }
    }
    Ok(out.join("\n"))
}

// ---------------------------------------------------------------------------
// variables

pub async fn list_vars(services: &Services, _args: ToolArgs) -> HandlerResult {
    let listing = services.vars.list().await?;
    let mut out = vec!["=== VARIABLE FILES ===".to_string(), String::new()];
    out.push("group_vars/:".to_string());
    if listing.group_vars.is_empty() {
        out.push("  (no files)".to_string());
    }
    for name in &listing.group_vars {
        out.push(format!("  - {name}"));
    }
    out.push(String::new());
    out.push("host_vars/:".to_string());
    if listing.host_vars.is_empty() {
        out.push("  (no files)".to_string());
    }
    for name in &listing.host_vars {
        out.push(format!("  - {name}"));
    }
    Ok(out.join("\n"))
}

async fn read_vars(services: &Services, scope: VarScope, name_key: &str, args: &ToolArgs) -> HandlerResult {
    let Some(name) = args.opt(name_key) else {
        // No name: list what is available instead of failing
        let listing = services.vars.list().await?;
        let names = match scope {
            VarScope::Group => listing.group_vars,
            VarScope::Host => listing.host_vars,
        };
        if names.is_empty() {
            return Ok(format!("No {scope} variable files found."));
        }
        return Ok(format!(
            "Available {scope} variable files:\n- {}",
            names.join("\n- ")
        ));
    };
    services.sanitizer.check(name_key, name, ArgClass::Name)?;
    let content = services.vars.read(scope, name).await?;
    let label = match scope {
        VarScope::Group => "GROUP VARS",
        VarScope::Host => "HOST VARS",
    };
    Ok(format!("=== {label}: {name} ===\n\n{content}"))
}

async fn write_vars(services: &Services, scope: VarScope, name_key: &str, args: &ToolArgs) -> HandlerResult {
    let name = args.require(name_key)?;
    let content = args.require("content")?;
    services.sanitizer.check(name_key, name, ArgClass::Name)?;
    services.sanitizer.check("content", content, ArgClass::Body)?;
    let backup = services.vars.write(scope, name, content).await?;
    let dir = match scope {
        VarScope::Group => "group_vars",
        VarScope::Host => "host_vars",
    };
    Ok(format!(
        "SUCCESS: {dir}/{name}.yml updated{}",
        backup_note(&backup)
    ))
}

pub async fn read_group_vars(services: &Services, args: ToolArgs) -> HandlerResult {
    read_vars(services, VarScope::Group, "group_name", &args).await
}

pub async fn write_group_vars(services: &Services, args: ToolArgs) -> HandlerResult {
    write_vars(services, VarScope::Group, "group_name", &args).await
}

pub async fn read_host_vars(services: &Services, args: ToolArgs) -> HandlerResult {
    read_vars(services, VarScope::Host, "hostname", &args).await
}

pub async fn write_host_vars(services: &Services, args: ToolArgs) -> HandlerResult {
    write_vars(services, VarScope::Host, "hostname", &args).await
}

pub async fn effective_vars(services: &Services, args: ToolArgs) -> HandlerResult {
    let hostname = args.require("hostname")?;
    services.sanitizer.check("hostname", hostname, ArgClass::Name)?;
    let merged = services.vars.effective(hostname).await?;
    let rendered = if merged.is_empty() {
        "(no variables)".to_string()
    } else {
        serde_yaml::to_string(&merged).unwrap_or_else(|_| "(unrenderable)".to_string())
    };
    Ok(format!("=== EFFECTIVE VARIABLES: {hostname} ===\n\n{rendered}"))
}

// ---------------------------------------------------------------------------
// engine configuration

pub async fn read_config(services: &Services, _args: ToolArgs) -> HandlerResult {
    let content = services.files.read_engine_config().await?;
    Ok(format!("=== ANSIBLE.CFG ===\n\n{content}"))
}

pub async fn write_config(services: &Services, args: ToolArgs) -> HandlerResult {
    let content = args.require("content")?;
    services.sanitizer.check("content", content, ArgClass::Body)?;
    let report = services.files.write_engine_config(content).await?;
    Ok(format!(
        "SUCCESS: ansible.cfg updated{}",
        backup_note(&report.backup)
    ))
}

// ---------------------------------------------------------------------------
// playbooks

pub async fn list_playbooks(services: &Services, _args: ToolArgs) -> HandlerResult {
    let playbooks = services.playbooks.list().await?;
    if playbooks.is_empty() {
        return Ok("No playbooks found. Use ansible_create_playbook to create one.".to_string());
    }
    let mut out = vec!["=== PLAYBOOKS ===".to_string(), String::new()];
    for info in &playbooks {
        match &info.description {
            Some(description) => out.push(format!("- {}: {description}", info.name)),
            None => out.push(format!("- {}", info.name)),
        }
    }
    out.push(format!("\nTotal: {} playbook(s)", playbooks.len()));
    Ok(out.join("\n"))
}

pub async fn create_playbook(services: &Services, args: ToolArgs) -> HandlerResult {
    let name = args.require("playbook_name")?;
    let content = args.require("content")?;
    services.sanitizer.check("playbook_name", name, ArgClass::Name)?;
    services.sanitizer.check("content", content, ArgClass::Body)?;
    let description = match args.opt("description") {
        Some(description) => {
            services
                .sanitizer
                .check("description", description, ArgClass::ProcessArg)?;
            Some(description)
        }
        None => None,
    };

    let report = services.playbooks.create(name, content, description).await?;
    match report.syntax {
        Some(syntax) if syntax.passed => Ok(format!(
            "SUCCESS: Playbook '{}' created and validated",
            report.name
        )),
        Some(syntax) => Ok(format!(
            "WARNING: Playbook '{}' created but has syntax errors:\n{}",
            report.name, syntax.diagnostics
        )),
        None => Ok(format!(
            "SUCCESS: Playbook '{}' created (engine unavailable, syntax not checked)",
            report.name
        )),
    }
}

pub async fn read_playbook(services: &Services, args: ToolArgs) -> HandlerResult {
    if args.opt("playbook_name").is_none() {
        return list_playbooks(services, args).await;
    }
    let name = args.require("playbook_name")?;
    services.sanitizer.check("playbook_name", name, ArgClass::Name)?;
    let content = services.playbooks.read(name).await?;
    Ok(format!("=== PLAYBOOK: {name} ===\n\n{content}"))
}

pub async fn edit_playbook(services: &Services, args: ToolArgs) -> HandlerResult {
    let name = args.require("playbook_name")?;
    let content = args.require("content")?;
    services.sanitizer.check("playbook_name", name, ArgClass::Name)?;
    services.sanitizer.check("content", content, ArgClass::Body)?;

    let report = services.playbooks.update(name, content).await?;
    let base = format!(
        "SUCCESS: Playbook '{}' updated{}",
        report.name,
        backup_note(&report.backup)
    );
    match report.syntax {
        Some(syntax) if !syntax.passed => Ok(format!(
            "WARNING: Playbook updated but has syntax errors:\n{}{}",
            syntax.diagnostics,
            backup_note(&report.backup)
        )),
        _ => Ok(base),
    }
}

pub async fn delete_playbook(services: &Services, args: ToolArgs) -> HandlerResult {
    let name = args.require("playbook_name")?;
    services.sanitizer.check("playbook_name", name, ArgClass::Name)?;
    if !args.flag("confirm") {
        return Ok(format!(
            "WARNING: This will delete '{name}'. Set confirm=yes to proceed."
        ));
    }
    let backup = services.playbooks.delete(name).await?;
    Ok(format!(
        "SUCCESS: Playbook '{name}' deleted\nBackup: {}",
        backup.file_name()
    ))
}

pub async fn validate_playbook(services: &Services, args: ToolArgs) -> HandlerResult {
    let name = args.require("playbook_name")?;
    services.sanitizer.check("playbook_name", name, ArgClass::Name)?;
    let report = services.playbooks.validate(name).await?;
    if report.passed {
        Ok(format!("SUCCESS: Playbook '{name}' syntax is valid"))
    } else {
        Ok(format!(
            "ERROR: Syntax errors in '{name}':\n{}",
            report.diagnostics
        ))
    }
}

pub async fn run_playbook(services: &Services, args: ToolArgs) -> HandlerResult {
    let request = RunPlaybookRequest::from_args(&services.sanitizer, &args)?;
    let opts = RunOptions {
        limit: request.limit,
        extra_vars: request.extra_vars,
        tags: request.tags,
        verbose: request.verbose,
    };
    let (result, rendering) = services.playbooks.run(&request.name, &opts).await?;
    if result.timed_out {
        return Ok(format!(
            "ERROR: Playbook run timed out after {} seconds",
            services.config.run_timeout.as_secs()
        ));
    }
    Ok(rendering)
}

pub async fn check_playbook(services: &Services, args: ToolArgs) -> HandlerResult {
    let name = args.require("playbook_name")?;
    services.sanitizer.check("playbook_name", name, ArgClass::Name)?;
    let limit = checked_opt(&services.sanitizer, &args, "limit_hosts")?;
    let (result, rendering) = services.playbooks.check(name, limit.as_deref()).await?;
    if result.timed_out {
        return Ok(format!(
            "ERROR: Check-mode run timed out after {} seconds",
            services.config.run_timeout.as_secs()
        ));
    }
    Ok(format!("=== DRY RUN (CHECK MODE) ===\n{rendering}"))
}

// ---------------------------------------------------------------------------
// device interaction

pub async fn adhoc_command(services: &Services, args: ToolArgs) -> HandlerResult {
    let module = args.require("module_name")?;
    services.sanitizer.check("module_name", module, ArgClass::Name)?;
    let pattern = args.opt("target_hosts").unwrap_or("all");
    services
        .sanitizer
        .check("target_hosts", pattern, ArgClass::ProcessArg)?;
    let module_args = match args.opt("module_args") {
        Some(value) => {
            services.sanitizer.check("module_args", value, ArgClass::Body)?;
            Some(value.to_string())
        }
        None => None,
    };
    let (_result, rendering) = services.devices.adhoc(pattern, module, module_args).await?;
    Ok(rendering)
}

pub async fn ping_devices(services: &Services, args: ToolArgs) -> HandlerResult {
    let pattern = args.opt("target_hosts").unwrap_or("all");
    services
        .sanitizer
        .check("target_hosts", pattern, ArgClass::ProcessArg)?;
    let report = services.devices.ping(pattern).await?;
    Ok(format!(
        "=== CONNECTIVITY ===\nReachable: {}\nFailed: {}\n\n{}",
        report.reachable, report.failed, report.rendering
    ))
}

pub async fn get_facts(services: &Services, args: ToolArgs) -> HandlerResult {
    let pattern = args.opt("target_hosts").unwrap_or("all");
    services
        .sanitizer
        .check("target_hosts", pattern, ArgClass::ProcessArg)?;
    let subset = checked_opt(&services.sanitizer, &args, "gather_subset")?;
    let (_result, rendering) = services.devices.facts(pattern, subset.as_deref()).await?;
    Ok(rendering)
}

pub async fn get_config(services: &Services, args: ToolArgs) -> HandlerResult {
    let pattern = args.opt("target_hosts").unwrap_or("all");
    services
        .sanitizer
        .check("target_hosts", pattern, ArgClass::ProcessArg)?;
    let format = args.opt("config_format").unwrap_or("text");
    services.sanitizer.check("config_format", format, ArgClass::Name)?;
    let (_result, rendering) = services.devices.get_config(pattern, format).await?;
    Ok(rendering)
}

pub async fn run_command(services: &Services, args: ToolArgs) -> HandlerResult {
    let commands = args.require("commands")?;
    services.sanitizer.check("commands", commands, ArgClass::Body)?;
    let pattern = args.opt("target_hosts").unwrap_or("all");
    services
        .sanitizer
        .check("target_hosts", pattern, ArgClass::ProcessArg)?;
    let (_result, rendering) = services.devices.run_commands(pattern, commands).await?;
    Ok(rendering)
}

pub async fn push_config(services: &Services, args: ToolArgs) -> HandlerResult {
    let request = PushConfigRequest::from_args(&services.sanitizer, &args)?;
    let (result, rendering) = services
        .devices
        .push_config(
            &request.targets,
            &request.config_lines,
            &request.format,
            request.commit,
            request.check_mode,
        )
        .await?;
    if result.timed_out {
        return Ok(format!(
            "ERROR: Configuration push timed out after {} seconds",
            services.config.device_timeout.as_secs()
        ));
    }
    if request.check_mode {
        Ok(format!("=== DRY RUN ===\n{rendering}"))
    } else {
        Ok(rendering)
    }
}

// ---------------------------------------------------------------------------
// templates

pub async fn list_templates(services: &Services, _args: ToolArgs) -> HandlerResult {
    let templates = services.files.list_templates().await?;
    if templates.is_empty() {
        return Ok("No templates found. Use ansible_create_template to create one.".to_string());
    }
    let listing: Vec<String> = templates.iter().map(|t| format!("- {t}")).collect();
    Ok(format!("=== TEMPLATES ===\n\n{}", listing.join("\n")))
}

pub async fn read_template(services: &Services, args: ToolArgs) -> HandlerResult {
    if args.opt("template_name").is_none() {
        return list_templates(services, args).await;
    }
    let name = args.require("template_name")?;
    services.sanitizer.check("template_name", name, ArgClass::Name)?;
    let content = services.files.read_template(name).await?;
    Ok(format!("=== TEMPLATE: {name} ===\n\n{content}"))
}

pub async fn create_template(services: &Services, args: ToolArgs) -> HandlerResult {
    let name = args.require("template_name")?;
    let content = args.require("content")?;
    services.sanitizer.check("template_name", name, ArgClass::Name)?;
    services.sanitizer.check("content", content, ArgClass::Body)?;
    let name = services.files.create_template(name, content).await?;
    Ok(format!("SUCCESS: Template '{name}' created"))
}
