//! Review step

use std::fmt::Write as _;

use serde::Serialize;

use crate::error::Result;
use crate::wizard::{WizardContent, WizardStep, WizardStepId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MpackSummary {
    pub display_name: String,
    pub version: String,
    pub download_url: String,
    /// `(os_type, repo_id, download_url)` of the selected operating systems
    pub repositories: Vec<(String, String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub name: String,
    pub mpack: String,
    pub instances: Vec<String>,
}

/// What the wizard is about to install.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub hosts: Vec<String>,
    pub mpacks: Vec<MpackSummary>,
    pub groups: Vec<GroupSummary>,
}

impl ReviewSummary {
    pub fn from_content(content: &WizardContent) -> Self {
        let mpacks = content
            .selected_mpacks
            .iter()
            .map(|m| MpackSummary {
                display_name: m.display_name.clone(),
                version: m.version.clone(),
                download_url: m.download_url.clone(),
                repositories: m
                    .operating_systems
                    .iter()
                    .filter(|os| os.selected)
                    .flat_map(|os| {
                        os.repos
                            .iter()
                            .map(|r| (os.os_type.clone(), r.repo_id.clone(), r.download_url.clone()))
                    })
                    .collect(),
            })
            .collect();

        let groups = content
            .added_service_groups
            .iter()
            .map(|g| GroupSummary {
                name: g.name.clone(),
                mpack: format!("{} {}", g.mpack_name, g.mpack_version),
                instances: content
                    .added_service_instances
                    .iter()
                    .filter(|i| i.group_name == g.name)
                    .map(|i| i.name.clone())
                    .collect(),
            })
            .collect();

        Self {
            hosts: content.hosts.clone(),
            mpacks,
            groups,
        }
    }

    /// Plain-text rendering
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Hosts ({}):", self.hosts.len());
        for host in &self.hosts {
            let _ = writeln!(out, "  {host}");
        }

        let _ = writeln!(out, "Mpacks:");
        for mpack in &self.mpacks {
            let _ = writeln!(out, "  {} {} <{}>", mpack.display_name, mpack.version, mpack.download_url);
            for (os, repo_id, url) in &mpack.repositories {
                let _ = writeln!(out, "    [{os}] {repo_id}: {url}");
            }
        }

        let _ = writeln!(out, "Service groups:");
        for group in &self.groups {
            let _ = writeln!(out, "  {} ({}): {}", group.name, group.mpack, group.instances.join(", "));
        }
        out
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReviewStep {
    summary: ReviewSummary,
}

impl ReviewStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> &ReviewSummary {
        &self.summary
    }
}

impl WizardStep for ReviewStep {
    fn id(&self) -> WizardStepId {
        WizardStepId::Review
    }

    fn load(&mut self, content: &WizardContent) -> Result<()> {
        self.summary = ReviewSummary::from_content(content);
        Ok(())
    }

    fn can_advance(&self) -> bool {
        true
    }

    fn save(&self, _content: &mut WizardContent) {}
}
