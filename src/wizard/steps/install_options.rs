//! Host input step

use crate::error::Result;
use crate::hosts::{evaluate_host_input, HostInputReport};
use crate::wizard::{WizardContent, WizardStep, WizardStepId};

/// Collects the hosts to add.
///
/// A pattern input must be confirmed once the user has seen its expansion.
#[derive(Debug, Clone, Default)]
pub struct InstallOptionsStep {
    host_names: String,
    registered: Vec<String>,
    report: HostInputReport,
    pattern_confirmed: bool,
    edited: bool,
}

impl InstallOptionsStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host_names(&self) -> &str {
        &self.host_names
    }

    pub fn report(&self) -> &HostInputReport {
        &self.report
    }

    /// Replace the host specification; any pattern confirmation is reset
    pub fn set_host_names(&mut self, spec: &str) {
        self.host_names = spec.to_string();
        self.report = evaluate_host_input(spec, &self.registered);
        self.pattern_confirmed = false;
        self.edited = true;
    }

    /// Accept the previewed expansion of a pattern input
    pub fn confirm_pattern(&mut self) {
        self.pattern_confirmed = true;
    }

    pub fn needs_pattern_confirmation(&self) -> bool {
        self.report.is_pattern && !self.pattern_confirmed
    }

    /// First problem blocking the step, for display
    pub fn host_error(&self) -> Option<String> {
        if !self.report.invalid.is_empty() {
            return Some(format!("Invalid host names: {}", self.report.invalid.join(", ")));
        }
        if self.report.hosts.is_empty() {
            if self.report.inputted_again.is_empty() {
                return Some("At least one host name is required".to_string());
            }
            return Some("All hosts are already part of the cluster".to_string());
        }
        None
    }
}

impl WizardStep for InstallOptionsStep {
    fn id(&self) -> WizardStepId {
        WizardStepId::InstallOptions
    }

    fn load(&mut self, content: &WizardContent) -> Result<()> {
        self.registered = content.registered_hosts.clone();
        self.host_names = content.host_names.clone();
        self.report = evaluate_host_input(&self.host_names, &self.registered);
        // Whatever was saved had been confirmed already.
        self.pattern_confirmed = !content.hosts.is_empty();
        self.edited = false;
        Ok(())
    }

    fn can_advance(&self) -> bool {
        self.host_error().is_none() && !self.needs_pattern_confirmation()
    }

    fn save(&self, content: &mut WizardContent) {
        content.host_names = self.host_names.clone();
        content.hosts = self.report.hosts.clone();
    }

    fn take_edited(&mut self) -> bool {
        std::mem::take(&mut self.edited)
    }
}
