//! Line-preserving model of the INI-style inventory
//!
//! Edits touch only the lines they have to: comments, spacing and `:vars` /
//! `:children` sections survive add/remove byte-for-byte. Host matching is
//! restricted to host sections, so a group name in a `:children` section can
//! never be mistaken for a host.

use serde::Serialize;

/// Section classification by bracket suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Hosts,
    Vars,
    Children,
}

/// A group and its member hosts, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct GroupEntry {
    pub name: String,
    pub hosts: Vec<String>,
}

/// The inventory file as an editable sequence of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryDocument {
    lines: Vec<String>,
    trailing_newline: bool,
}

impl InventoryDocument {
    pub fn parse(content: &str) -> Self {
        if content.is_empty() {
            return Self {
                lines: Vec::new(),
                trailing_newline: false,
            };
        }
        let trailing_newline = content.ends_with('\n');
        let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
        if trailing_newline {
            lines.pop();
        }
        Self {
            lines,
            trailing_newline,
        }
    }

    pub fn empty() -> Self {
        Self::parse("")
    }

    pub fn render(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut out = self.lines.join("\n");
        if self.trailing_newline {
            out.push('\n');
        }
        out
    }

    pub fn contains_host(&self, host: &str) -> bool {
        self.host_lines().any(|(_, name, _)| name == host)
    }

    /// Unique host names, in file order.
    pub fn host_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for (_, name, _) in self.host_lines() {
            if !names.iter().any(|n| n == &name) {
                names.push(name);
            }
        }
        names
    }

    /// Groups with their member hosts, in declared order. Hosts above the
    /// first section header are reported under `ungrouped`.
    pub fn groups(&self) -> Vec<GroupEntry> {
        let mut entries: Vec<GroupEntry> = Vec::new();
        for (section, name, _) in self.host_lines() {
            let group = section.unwrap_or_else(|| "ungrouped".to_string());
            match entries.iter_mut().find(|e| e.name == group) {
                Some(entry) => {
                    if !entry.hosts.contains(&name) {
                        entry.hosts.push(name);
                    }
                }
                None => entries.push(GroupEntry {
                    name: group,
                    hosts: vec![name],
                }),
            }
        }
        entries
    }

    /// Groups the host belongs to, in inventory-declared order.
    pub fn host_groups(&self, host: &str) -> Vec<String> {
        let mut groups = Vec::new();
        for (section, name, _) in self.host_lines() {
            if name == host {
                if let Some(section) = section {
                    if !groups.contains(&section) {
                        groups.push(section);
                    }
                }
            }
        }
        groups
    }

    /// Inline `key=value` variables from the host's first line.
    pub fn inline_vars(&self, host: &str) -> Vec<(String, String)> {
        for (_, name, line) in self.host_lines() {
            if name == host {
                return line
                    .split_whitespace()
                    .skip(1)
                    .filter_map(|token| {
                        token
                            .split_once('=')
                            .map(|(k, v)| (k.to_string(), v.to_string()))
                    })
                    .collect();
            }
        }
        Vec::new()
    }

    /// Insert a host line into a group section, creating the section at the
    /// end of the file when absent. Duplicate checking is the store's job.
    pub fn add_host(&mut self, group: &str, host_line: &str) {
        for idx in 0..self.lines.len() {
            if let Some((name, SectionKind::Hosts)) = section_header(&self.lines[idx]) {
                if name == group {
                    self.lines.insert(idx + 1, host_line.to_string());
                    return;
                }
            }
        }

        if self.lines.is_empty() {
            self.trailing_newline = true;
        } else {
            self.lines.push(String::new());
        }
        self.lines.push(format!("[{group}]"));
        self.lines.push(host_line.to_string());
    }

    /// Remove every line for `host` from host sections (and the preamble).
    /// A section the removal left without content is pruned together with
    /// the blank separator above it, which is what makes add followed by
    /// remove restore the file byte-for-byte. Returns the number of lines
    /// removed.
    pub fn remove_host(&mut self, host: &str) -> usize {
        let mut removed = 0;
        let mut affected_headers: Vec<usize> = Vec::new();
        let mut current: Option<(usize, SectionKind)> = None;

        let mut i = 0;
        while i < self.lines.len() {
            if let Some((_, kind)) = section_header(&self.lines[i]) {
                current = Some((i, kind));
                i += 1;
                continue;
            }
            let in_host_scope = match current {
                None => true,
                Some((_, SectionKind::Hosts)) => true,
                Some(_) => false,
            };
            if in_host_scope && host_token(&self.lines[i]) == Some(host) {
                self.lines.remove(i);
                removed += 1;
                if let Some((header, _)) = current {
                    affected_headers.push(header);
                }
                continue;
            }
            i += 1;
        }

        affected_headers.sort_unstable();
        affected_headers.dedup();
        for header in affected_headers.into_iter().rev() {
            self.prune_if_empty(header);
        }
        removed
    }

    fn prune_if_empty(&mut self, header: usize) {
        let mut end = header + 1;
        while end < self.lines.len() && section_header(&self.lines[end]).is_none() {
            if !self.lines[end].trim().is_empty() {
                return;
            }
            end += 1;
        }
        self.lines.drain(header..end);
        if header > 0 && self.lines[header - 1].trim().is_empty() {
            self.lines.remove(header - 1);
        }
    }

    /// Host lines as `(enclosing host-section name, host name, raw line)`.
    fn host_lines(&self) -> impl Iterator<Item = (Option<String>, String, &str)> + '_ {
        let mut current: Option<(String, SectionKind)> = None;
        self.lines.iter().filter_map(move |line| {
            if let Some((name, kind)) = section_header(line) {
                current = Some((name, kind));
                return None;
            }
            let section = match &current {
                None => None,
                Some((name, SectionKind::Hosts)) => Some(name.clone()),
                Some(_) => return None,
            };
            host_token(line).map(|host| (section, host.to_string(), line.as_str()))
        })
    }
}

fn section_header(line: &str) -> Option<(String, SectionKind)> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('[')?.strip_suffix(']')?;
    if let Some(name) = inner.strip_suffix(":vars") {
        Some((name.to_string(), SectionKind::Vars))
    } else if let Some(name) = inner.strip_suffix(":children") {
        Some((name.to_string(), SectionKind::Children))
    } else {
        Some((inner.to_string(), SectionKind::Hosts))
    }
}

fn host_token(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
        return None;
    }
    trimmed.split_whitespace().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# lab switches
[qfx_switches]
sw1 ansible_host=10.0.0.1
sw2 ansible_host=10.0.0.2

[qfx_switches:vars]
ansible_network_os=junos

[edge]
sw1 ansible_host=10.0.0.1
";

    #[test]
    fn parse_render_round_trip() {
        let doc = InventoryDocument::parse(SAMPLE);
        assert_eq!(doc.render(), SAMPLE);
    }

    #[test]
    fn host_names_are_unique_in_order() {
        let doc = InventoryDocument::parse(SAMPLE);
        assert_eq!(doc.host_names(), vec!["sw1", "sw2"]);
    }

    #[test]
    fn vars_sections_are_not_host_scope() {
        let doc = InventoryDocument::parse(SAMPLE);
        assert!(!doc.contains_host("ansible_network_os=junos"));
        let groups = doc.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "qfx_switches");
        assert_eq!(groups[0].hosts, vec!["sw1", "sw2"]);
    }

    #[test]
    fn host_groups_in_declared_order() {
        let doc = InventoryDocument::parse(SAMPLE);
        assert_eq!(doc.host_groups("sw1"), vec!["qfx_switches", "edge"]);
    }

    #[test]
    fn inline_vars_come_from_first_host_line() {
        let doc = InventoryDocument::parse(SAMPLE);
        assert_eq!(
            doc.inline_vars("sw2"),
            vec![("ansible_host".to_string(), "10.0.0.2".to_string())]
        );
    }

    #[test]
    fn add_into_existing_group_inserts_after_header() {
        let mut doc = InventoryDocument::parse(SAMPLE);
        doc.add_host("qfx_switches", "sw3 ansible_host=10.0.0.3");
        let rendered = doc.render();
        assert!(rendered.contains("[qfx_switches]\nsw3 ansible_host=10.0.0.3\nsw1"));
    }

    #[test]
    fn add_then_remove_restores_bytes() {
        let mut doc = InventoryDocument::parse(SAMPLE);
        doc.add_host("spine", "sw9 ansible_host=10.0.0.9");
        assert!(doc.contains_host("sw9"));
        assert_eq!(doc.remove_host("sw9"), 1);
        assert_eq!(doc.render(), SAMPLE);
    }

    #[test]
    fn add_then_remove_on_empty_file() {
        let mut doc = InventoryDocument::empty();
        doc.add_host("spine", "sw9 ansible_host=10.0.0.9");
        assert_eq!(doc.render(), "[spine]\nsw9 ansible_host=10.0.0.9\n");
        doc.remove_host("sw9");
        assert_eq!(doc.render(), "");
    }

    #[test]
    fn remove_from_every_section() {
        let mut doc = InventoryDocument::parse(SAMPLE);
        assert_eq!(doc.remove_host("sw1"), 2);
        assert!(!doc.contains_host("sw1"));
        // edge is now empty and pruned; qfx_switches keeps sw2
        assert!(doc.render().contains("sw2"));
        assert!(!doc.render().contains("[edge]"));
        assert!(doc.render().contains("[qfx_switches:vars]"));
    }

    #[test]
    fn remove_missing_host_is_zero() {
        let mut doc = InventoryDocument::parse(SAMPLE);
        assert_eq!(doc.remove_host("nope"), 0);
        assert_eq!(doc.render(), SAMPLE);
    }
}
