//! Outcome classification, report aggregation, and rendering.
//!
//! Every configured target yields exactly one [`Outcome`] per run. The
//! aggregator orders failures ahead of successes (stable within each
//! class) so the delivered report leads with what needs attention.

/// Status of one target's check-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    /// Symbol used in both the HTML report and the log lines.
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Success => "✅",
            Status::Failure => "❌",
        }
    }
}

/// Why a target ended up with its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeKind {
    /// The identifier did not match any contact in the roster snapshot.
    MissingContact,
    /// The target had no command configured.
    MissingCommand,
    /// The command was sent but no reply carried a matching button.
    MissingButton,
    /// The target was deliberately not executed (e.g. a dry run).
    Skipped,
    Success,
}

/// The classified result of one target's interaction.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub identifier: String,
    pub display_name: String,
    pub kind: OutcomeKind,
    pub details: String,
}

impl Outcome {
    pub fn missing_contact(identifier: &str, display_name: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            display_name: display_name.to_string(),
            kind: OutcomeKind::MissingContact,
            details: "target not found".to_string(),
        }
    }

    pub fn missing_command(identifier: &str, display_name: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            display_name: display_name.to_string(),
            kind: OutcomeKind::MissingCommand,
            details: "missing signin command".to_string(),
        }
    }

    pub fn missing_button(identifier: &str, display_name: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            display_name: display_name.to_string(),
            kind: OutcomeKind::MissingButton,
            details: "missing signin button".to_string(),
        }
    }

    pub fn skipped(identifier: &str, display_name: &str, reason: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            display_name: display_name.to_string(),
            kind: OutcomeKind::Skipped,
            details: reason.to_string(),
        }
    }

    pub fn success(identifier: &str, display_name: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            display_name: display_name.to_string(),
            kind: OutcomeKind::Success,
            details: String::new(),
        }
    }

    /// Success is the only success-status kind; everything else is a
    /// failure for sorting and rendering purposes.
    pub fn status(&self) -> Status {
        match self.kind {
            OutcomeKind::Success => Status::Success,
            _ => Status::Failure,
        }
    }
}

/// The ordered set of outcomes for one run.
#[derive(Debug, Clone)]
pub struct Report {
    pub outcomes: Vec<Outcome>,
}

/// Collect outcomes into a report, failures first.
///
/// Stable partition: entries with equal status keep their relative
/// input order. No outcome is filtered or duplicated.
pub fn aggregate(mut outcomes: Vec<Outcome>) -> Report {
    outcomes.sort_by_key(|o| o.status() == Status::Success);
    Report { outcomes }
}

/// Escape the five HTML-reserved characters.
///
/// Contact names and details are arbitrary user-controlled text; run
/// everything dynamic through this before embedding it in the report.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render the report as a self-contained HTML document.
///
/// One row per outcome: linked display name, status symbol, details.
pub fn render_html(report: &Report) -> String {
    let mut html = String::from(
        "<html><body><table>\n\
         <tr><th>Target</th><th>Status</th><th>Details</th></tr>\n",
    );

    for outcome in &report.outcomes {
        html.push_str(&format!(
            "<tr><td><a href=\"https://t.me/{id}\">{name}</a></td><td>{symbol}</td><td>{details}</td></tr>\n",
            id = escape_html(&outcome.identifier),
            name = escape_html(&outcome.display_name),
            symbol = outcome.status().symbol(),
            details = escape_html(&outcome.details),
        ));
    }

    html.push_str("</table></body></html>\n");
    html
}

/// One plain-text line per outcome, for terminal echo.
pub fn log_lines(report: &Report) -> Vec<String> {
    report
        .outcomes
        .iter()
        .map(|o| match o.status() {
            Status::Success => format!(
                "@{} - {} - {}",
                o.identifier,
                o.display_name,
                o.status().symbol()
            ),
            Status::Failure => format!(
                "@{} - {} - {} - {}",
                o.identifier,
                o.display_name,
                o.status().symbol(),
                o.details
            ),
        })
        .collect()
}
