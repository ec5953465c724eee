//! Output formatting utilities for the CLI
//!
//! Status lines come from `ct_setup::output`; this module adds the table
//! shown by `code-tunnel status`.

use tabled::{settings::Style, Table, Tabled};

pub use ct_setup::output::{print_error, print_info, print_success, print_warning};

/// One row of the installation report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentStatus {
    pub component: String,
    pub ready: bool,
    pub detail: String,
}

impl ComponentStatus {
    pub fn new(component: &str, ready: bool, detail: impl Into<String>) -> Self {
        Self {
            component: component.to_string(),
            ready,
            detail: detail.into(),
        }
    }
}

/// Format the installation report as an ASCII table
pub fn format_components(components: &[ComponentStatus]) -> String {
    #[derive(Tabled)]
    struct ComponentRow {
        #[tabled(rename = "COMPONENT")]
        component: String,
        #[tabled(rename = "STATUS")]
        status: &'static str,
        #[tabled(rename = "DETAIL")]
        detail: String,
    }

    let rows: Vec<ComponentRow> = components
        .iter()
        .map(|c| ComponentRow {
            component: c.component.clone(),
            status: if c.ready { "ready" } else { "missing" },
            detail: truncate(&c.detail, 60),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Truncate a string with ellipsis if too long
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
