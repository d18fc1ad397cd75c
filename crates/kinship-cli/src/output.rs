//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use kinship_domain::{ConfirmState, InferenceJob, Origin, RelationApply, RelationEdge, RelationStatus};
use kinship_service::NetworkView;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format relation edges.
    pub fn format_edges(&self, edges: &[RelationEdge]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(edges)?),
            OutputFormat::Table => Ok(self.edges_table(edges)),
            OutputFormat::Quiet => Ok(join_ids(edges.iter().map(|e| e.id.to_string()))),
        }
    }

    fn edges_table(&self, edges: &[RelationEdge]) -> String {
        if edges.is_empty() {
            return self.colorize("No relations found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Owner", "Other", "Term", "Chain", "Origin", "State"]);

        for edge in edges {
            builder.push_record([
                edge.id.to_string(),
                edge.owner_id.to_string(),
                edge.other_id.to_string(),
                edge.kinship_term.clone(),
                edge.chain.to_string(),
                self.origin_label(edge.origin),
                self.state_label(edge.confirm_state),
            ]);
        }

        styled(builder)
    }

    /// Format applications.
    pub fn format_applications(&self, applies: &[RelationApply]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(applies)?),
            OutputFormat::Quiet => Ok(join_ids(applies.iter().map(|a| a.id.to_string()))),
            OutputFormat::Table => {
                if applies.is_empty() {
                    return Ok(self.colorize("No pending applications.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "Applicant", "Target", "Term", "Chain", "Note"]);
                for apply in applies {
                    builder.push_record([
                        apply.id.to_string(),
                        apply.applicant_id.to_string(),
                        apply.target_id.to_string(),
                        apply.proposed_term.clone(),
                        apply.proposed_chain.to_string(),
                        apply.note.clone().unwrap_or_default(),
                    ]);
                }
                Ok(styled(builder))
            }
        }
    }

    /// Format a network view: members first, then their edges.
    pub fn format_network(&self, view: &NetworkView) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(view)?),
            OutputFormat::Quiet => Ok(join_ids(view.nodes.iter().map(|n| n.id.to_string()))),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Person", "Gender"]);
                for node in &view.nodes {
                    let id = if node.id == view.origin {
                        self.colorize(&format!("{} *", node.id), "cyan")
                    } else {
                        node.id.to_string()
                    };
                    builder.push_record([id, node.gender.as_str().to_string()]);
                }
                Ok(format!("{}\n{}", styled(builder), self.edges_table(&view.edges)))
            }
        }
    }

    /// Format a job record.
    pub fn format_job(&self, job: &InferenceJob) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(job)?),
            OutputFormat::Quiet => Ok(job.job_id.to_string()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Job", "Owner", "Status", "Progress", "Message"]);
                builder.push_record([
                    job.job_id.to_string(),
                    job.owner_id.to_string(),
                    format!("{:?}", job.status),
                    format!("{}%", job.percent),
                    job.message.clone(),
                ]);
                let mut out = styled(builder);
                if let Some(summary) = &job.result_summary {
                    out.push_str(&format!(
                        "\nNetwork: {} people, {} manual pairs, {} inferred removed, {} inferred now",
                        summary.network_size, summary.manual_edges, summary.deleted_inferred, summary.inferred_after
                    ));
                }
                Ok(out)
            }
        }
    }

    /// Format a relation status.
    pub fn format_status(&self, status: RelationStatus) -> String {
        match status {
            RelationStatus::Related => self.colorize("related", "green"),
            RelationStatus::Pending => self.colorize("pending", "yellow"),
            RelationStatus::None => "none".to_string(),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn origin_label(&self, origin: Origin) -> String {
        match origin {
            Origin::Manual => origin.as_str().to_string(),
            Origin::Inferred => self.colorize(origin.as_str(), "magenta"),
        }
    }

    fn state_label(&self, state: ConfirmState) -> String {
        match state {
            ConfirmState::Confirmed => self.colorize(state.as_str(), "green"),
            ConfirmState::Pending => self.colorize(state.as_str(), "yellow"),
            ConfirmState::Rejected => self.colorize(state.as_str(), "red"),
        }
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

fn styled(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn join_ids(ids: impl Iterator<Item = String>) -> String {
    ids.collect::<Vec<_>>().join("\n")
}
