// Path: crates/alerting/src/message.rs
use govwatch_types::{Proposal, Validator};
use time::{format_description::well_known::Rfc3339, Duration};

/// Renders the alert delivered for an unvoted proposal.
pub fn format_alert(
    validator: &Validator,
    account_address: &str,
    proposal: &Proposal,
    remaining: Duration,
) -> String {
    let deadline = proposal
        .voting_end_time
        .format(&Rfc3339)
        .unwrap_or_else(|_| proposal.voting_end_time.unix_timestamp().to_string());
    let title = proposal
        .title
        .as_deref()
        .map(|t| format!(" \"{t}\""))
        .unwrap_or_default();
    let minutes = remaining.whole_minutes().max(0);
    format!(
        "Validator {} ({}) on {} has not voted on proposal #{}{}; voting ends {} ({}h {}m left).",
        validator.address,
        account_address,
        validator.chain_name,
        proposal.id,
        title,
        deadline,
        minutes / 60,
        minutes % 60
    )
}
