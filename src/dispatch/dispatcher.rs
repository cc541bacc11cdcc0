//! The dispatch table and the one-call-at-a-time gate

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::guard::ArgClass;

use super::{handlers, DispatchError, Services, ToolArgs};

type HandlerFuture = Pin<Box<dyn Future<Output = Result<String, DispatchError>> + Send>>;
type Handler = fn(Arc<Services>, ToolArgs) -> HandlerFuture;

macro_rules! handler {
    ($name:ident) => {{
        fn call(services: Arc<Services>, args: ToolArgs) -> HandlerFuture {
            Box::pin(async move { handlers::$name(&services, args).await })
        }
        call as Handler
    }};
}

/// Maps tool names to typed handlers; built once at startup. Calls are
/// serialized: the dispatcher is idle or has exactly one call in flight.
pub struct Dispatcher {
    services: Arc<Services>,
    table: HashMap<&'static str, Handler>,
    in_flight: Mutex<()>,
}

impl Dispatcher {
    pub fn new(services: Arc<Services>) -> Self {
        let mut table: HashMap<&'static str, Handler> = HashMap::new();

        table.insert("ansible_show_structure", handler!(show_structure));
        table.insert("ansible_read_file", handler!(read_file));
        table.insert("ansible_write_file", handler!(write_file));
        table.insert("ansible_list_backups", handler!(list_backups));
        table.insert("ansible_restore_file", handler!(restore_file));

        table.insert("ansible_read_inventory", handler!(read_inventory));
        table.insert("ansible_write_inventory", handler!(write_inventory));
        table.insert("ansible_add_host", handler!(add_host));
        table.insert("ansible_remove_host", handler!(remove_host));
        table.insert("ansible_list_inventory", handler!(list_inventory));

        table.insert("ansible_list_vars", handler!(list_vars));
        table.insert("ansible_read_group_vars", handler!(read_group_vars));
        table.insert("ansible_write_group_vars", handler!(write_group_vars));
        table.insert("ansible_read_host_vars", handler!(read_host_vars));
        table.insert("ansible_write_host_vars", handler!(write_host_vars));
        table.insert("ansible_effective_vars", handler!(effective_vars));

        table.insert("ansible_read_config", handler!(read_config));
        table.insert("ansible_write_config", handler!(write_config));

        table.insert("ansible_list_playbooks", handler!(list_playbooks));
        table.insert("ansible_create_playbook", handler!(create_playbook));
        table.insert("ansible_read_playbook", handler!(read_playbook));
        table.insert("ansible_edit_playbook", handler!(edit_playbook));
        table.insert("ansible_delete_playbook", handler!(delete_playbook));
        table.insert("ansible_validate_playbook", handler!(validate_playbook));
        table.insert("ansible_run_playbook", handler!(run_playbook));
        table.insert("ansible_check_playbook", handler!(check_playbook));

        table.insert("ansible_adhoc_command", handler!(adhoc_command));
        table.insert("ansible_ping_devices", handler!(ping_devices));
        table.insert("ansible_get_facts", handler!(get_facts));
        table.insert("ansible_get_config", handler!(get_config));
        table.insert("ansible_run_command", handler!(run_command));
        table.insert("ansible_push_config", handler!(push_config));

        table.insert("ansible_list_templates", handler!(list_templates));
        table.insert("ansible_read_template", handler!(read_template));
        table.insert("ansible_create_template", handler!(create_template));

        Self {
            services,
            table,
            in_flight: Mutex::new(()),
        }
    }

    /// Registered tool names, sorted.
    pub fn tool_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.table.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Run one tool call: sanitize, operate, mask, stringify. Errors come
    /// back as `ERROR:` text; they never cross this boundary as faults.
    pub async fn dispatch(&self, tool: &str, args: HashMap<String, String>) -> String {
        let _guard = self.in_flight.lock().await;

        if self
            .services
            .sanitizer
            .check("tool", tool, ArgClass::Name)
            .is_err()
        {
            warn!("rejected malformed tool name");
            return "ERROR: Unknown tool".to_string();
        }

        let Some(handler) = self.table.get(tool) else {
            warn!(tool, "unknown tool requested");
            return format!("ERROR: Unknown tool: {tool}");
        };

        debug!(tool, "dispatching");
        let outcome = handler(self.services.clone(), ToolArgs::new(args)).await;
        let text = match outcome {
            Ok(text) => text,
            Err(err) => format!("ERROR: {err}"),
        };
        // Single outbound masking point for every result and error path
        self.services.sanitizer.mask(&text)
    }
}
