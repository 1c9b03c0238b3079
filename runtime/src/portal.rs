//! What the extractor looks for on the portal.
//!
//! Everything page-specific lives here so a markup change on the portal is
//! a profile change, not a flow change.

use crate::extraction::deep::NodeQuery;
use chrono::{FixedOffset, Offset, Utc};

/// Public entry page of the portal.
pub const DEFAULT_PORTAL_URL: &str = "https://connectcloud.cummins.com";

/// The interaction signature of one portal.
#[derive(Debug, Clone)]
pub struct PortalProfile {
    pub entry_url: String,
    /// Opened after sign-in when set; otherwise the post-login landing page
    /// is the dashboard.
    pub dashboard_url: Option<String>,
    /// Text of the sign-in affordance. It sits in a span inside the button.
    pub sign_in_text: String,
    pub username_selector: String,
    pub password_selector: String,
    pub submit_selector: String,
    /// Dashboard section holding runtime hours.
    pub maintenance_section: String,
    /// Dashboard section holding the battery reading.
    pub generator_data_section: String,
    /// Dashboard section holding the events tab.
    pub notifications_section: String,
    pub events_tab: String,
    pub runtime_units: String,
    pub battery_label: String,
    pub exercise_label: String,
    /// Offset the portal's wall-clock dates are read at.
    pub display_offset: FixedOffset,
}

impl Default for PortalProfile {
    fn default() -> Self {
        Self {
            entry_url: DEFAULT_PORTAL_URL.to_string(),
            dashboard_url: None,
            sign_in_text: "SIGN IN".to_string(),
            username_selector: r#"input[name="username"]"#.to_string(),
            password_selector: r#"input[name="password"]"#.to_string(),
            submit_selector: "button.slds-button_brand".to_string(),
            maintenance_section: "Maintenance".to_string(),
            generator_data_section: "Generator Data".to_string(),
            notifications_section: "Notifications".to_string(),
            events_tab: "Events".to_string(),
            runtime_units: "Hours".to_string(),
            battery_label: "Battery Voltage (V)".to_string(),
            exercise_label: "Genset exercise completed".to_string(),
            display_offset: Utc.fix(),
        }
    }
}

impl PortalProfile {
    pub fn with_entry_url(mut self, url: impl Into<String>) -> Self {
        self.entry_url = url.into();
        self
    }

    pub fn sign_in(&self) -> NodeQuery {
        NodeQuery::containing(&self.sign_in_text).own_text().visible()
    }

    pub fn username_input(&self) -> NodeQuery {
        NodeQuery::css(&self.username_selector)
    }

    pub fn password_input(&self) -> NodeQuery {
        NodeQuery::css(&self.password_selector)
    }

    pub fn submit_button(&self) -> NodeQuery {
        NodeQuery::css(&self.submit_selector)
    }

    /// A collapsible dashboard section: a `<p>` whose own text names it.
    pub fn section(&self, name: &str) -> NodeQuery {
        NodeQuery::containing(name).own_text().tags(&["p"]).visible()
    }

    /// Tab labels carry counters (`Events (16)`), so match loosely.
    pub fn tab(&self, name: &str) -> NodeQuery {
        NodeQuery::containing(name).ignore_case().clickable_leaf()
    }

    pub fn runtime_reading(&self) -> NodeQuery {
        NodeQuery::containing(&self.runtime_units).own_text()
    }

    pub fn battery_label(&self) -> NodeQuery {
        NodeQuery::labelled(&self.battery_label)
    }

    pub fn exercise_entry(&self) -> NodeQuery {
        NodeQuery::containing(&self.exercise_label).tags(&["p"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::deep::{TextMatch, TextScope};

    #[test]
    fn test_default_profile_targets_portal() {
        let profile = PortalProfile::default();
        assert_eq!(profile.entry_url, DEFAULT_PORTAL_URL);
        assert_eq!(profile.display_offset.local_minus_utc(), 0);
        assert_eq!(
            profile.username_input().selector.as_deref(),
            Some(r#"input[name="username"]"#)
        );
    }

    #[test]
    fn test_tab_query_is_loose() {
        let q = PortalProfile::default().tab("Events");
        assert!(!q.case_sensitive);
        assert!(q.clickable_leaf);
        assert_eq!(q.text_match, TextMatch::Contains);
    }

    #[test]
    fn test_sign_in_requires_visible_control() {
        let q = PortalProfile::default().sign_in();
        assert!(q.visible_only);
        assert_eq!(q.text_scope, TextScope::Own);
    }

    #[test]
    fn test_battery_label_is_exact() {
        let q = PortalProfile::default().battery_label();
        assert_eq!(q.text_match, TextMatch::Exact);
        assert_eq!(q.text_scope, TextScope::All);
    }
}
