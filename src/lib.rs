//! Rustle Workbench - guarded manager for Ansible automation workspaces
//!
//! This crate exposes a set of named tools that let a conversational client
//! inspect, edit and execute the artifacts of a single Ansible workspace
//! (inventory, variable files, configuration, playbooks) and drive the
//! external engine against network devices. Every operation runs behind a
//! trust boundary: path containment, input sanitization, backup-before-write
//! and shell-free process invocation with masked output.

pub mod backup;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod guard;
pub mod inventory;
pub mod playbook;
pub mod runner;
pub mod vars;
pub mod workspace;

pub use config::WorkspaceConfig;
pub use dispatch::{Dispatcher, Services};
