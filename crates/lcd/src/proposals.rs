// Path: crates/lcd/src/proposals.rs
use crate::fetcher::{display_url, HttpFetcher};
use govwatch_telemetry::lcd_metrics;
use govwatch_types::{
    error::{DecodeError, WatchError},
    Proposal, ProposalStatus,
};
use serde::Deserialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// The governance proposals resource.
pub const PROPOSALS_PATH: &str = "/cosmos/gov/v1beta1/proposals";

// Upper bound on followed `next_key` links so a misbehaving endpoint cannot
// keep a chain worker busy forever.
const MAX_PAGES: usize = 20;

#[derive(Deserialize)]
struct ProposalsResponse {
    proposals: Vec<WireProposal>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct Pagination {
    #[serde(default)]
    next_key: Option<String>,
}

#[derive(Deserialize)]
struct WireProposal {
    #[serde(alias = "id")]
    proposal_id: StringOrNumber,
    voting_end_time: String,
    status: StatusField,
    #[serde(default)]
    content: Option<WireContent>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Deserialize)]
struct WireContent {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Str(String),
    Num(u64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StatusField {
    Code(i64),
    Name(String),
}

/// One page of the proposals listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalPage {
    pub proposals: Vec<Proposal>,
    /// Opaque continuation key, `None` on the last page.
    pub next_key: Option<String>,
}

/// Decodes a proposals listing.
///
/// A body without a `proposals` array is an error. Only an explicit empty
/// array means the chain has no matching proposals.
pub fn decode_proposals(url: &str, body: &[u8]) -> Result<ProposalPage, DecodeError> {
    let resp: ProposalsResponse = serde_json::from_slice(body).map_err(|e| DecodeError::Json {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let proposals = resp
        .proposals
        .into_iter()
        .map(|p| {
            let id = match p.proposal_id {
                StringOrNumber::Str(s) => s,
                StringOrNumber::Num(n) => n.to_string(),
            };
            if id.trim().is_empty() {
                return Err(DecodeError::Field {
                    url: url.to_string(),
                    field: "proposal_id",
                    reason: "empty identifier".into(),
                });
            }
            let voting_end_time =
                OffsetDateTime::parse(&p.voting_end_time, &Rfc3339).map_err(|e| {
                    DecodeError::Field {
                        url: url.to_string(),
                        field: "voting_end_time",
                        reason: format!("'{}': {}", p.voting_end_time, e),
                    }
                })?;
            let status = match p.status {
                StatusField::Code(c) => ProposalStatus::from_code(c),
                StatusField::Name(n) => ProposalStatus::from_name(&n),
            };
            let title = p.title.or_else(|| p.content.and_then(|c| c.title));
            Ok(Proposal {
                id,
                voting_end_time,
                status,
                title,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let next_key = resp
        .pagination
        .and_then(|p| p.next_key)
        .filter(|k| !k.is_empty());
    Ok(ProposalPage {
        proposals,
        next_key,
    })
}

/// Fetches every proposal currently in its voting period from `base_url`.
pub async fn fetch_active_proposals(
    fetcher: &dyn HttpFetcher,
    base_url: &str,
) -> Result<Vec<Proposal>, WatchError> {
    let status_code = ProposalStatus::VotingPeriod.code().to_string();
    let mut all = Vec::new();
    let mut page_key: Option<String> = None;

    for _ in 0..MAX_PAGES {
        let mut query: Vec<(&str, &str)> = vec![("proposal_status", status_code.as_str())];
        if let Some(key) = page_key.as_deref() {
            query.push(("pagination.key", key));
        }
        let url = display_url(base_url, PROPOSALS_PATH, &query);
        let resp = fetcher.fetch(base_url, PROPOSALS_PATH, &query).await?;
        lcd_metrics().inc_requests_total("proposals", resp.status);
        if !resp.is_success() {
            return Err(resp.into_status_error(url).into());
        }
        let page = decode_proposals(&url, &resp.body)?;
        all.extend(page.proposals);
        match page.next_key {
            Some(next) => page_key = Some(next),
            None => return Ok(all),
        }
    }

    tracing::warn!(
        target: "lcd",
        endpoint = %base_url,
        pages = MAX_PAGES,
        "proposal listing still paginating after page limit; using partial result"
    );
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    const URL: &str = "https://lcd.example/cosmos/gov/v1beta1/proposals";

    #[test]
    fn test_decode_integer_status() {
        let body = br#"{
            "proposals": [{
                "proposal_id": "42",
                "content": {"@type": "/cosmos.gov.v1beta1.TextProposal", "title": "Upgrade"},
                "status": 2,
                "voting_end_time": "2026-10-16T08:00:00.123456789Z"
            }],
            "pagination": {"next_key": null, "total": "1"}
        }"#;
        let page = decode_proposals(URL, body).unwrap();
        assert_eq!(page.proposals.len(), 1);
        let p = &page.proposals[0];
        assert_eq!(p.id, "42");
        assert!(p.is_voting());
        assert_eq!(p.title.as_deref(), Some("Upgrade"));
        assert_eq!(p.voting_end_time.unix_timestamp(), 1_792_137_600);
        assert!(page.next_key.is_none());
    }

    #[test]
    fn test_decode_named_status_and_numeric_id() {
        let body = br#"{"proposals": [{
            "proposal_id": 7,
            "status": "PROPOSAL_STATUS_PASSED",
            "voting_end_time": "2026-01-01T00:00:00Z"
        }]}"#;
        let page = decode_proposals(URL, body).unwrap();
        assert_eq!(page.proposals[0].id, "7");
        assert_eq!(page.proposals[0].status, ProposalStatus::Passed);
    }

    #[test]
    fn test_empty_list_is_not_an_error() {
        let page = decode_proposals(URL, br#"{"proposals": []}"#).unwrap();
        assert!(page.proposals.is_empty());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let err = decode_proposals(URL, b"<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, DecodeError::Json { .. }));
        let err = decode_proposals(URL, br#"{"result": []}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Json { .. }));
    }

    #[test]
    fn test_bad_deadline_is_a_field_error() {
        let body = br#"{"proposals": [{
            "proposal_id": "1", "status": 2, "voting_end_time": "tomorrow"
        }]}"#;
        let err = decode_proposals(URL, body).unwrap_err();
        assert!(matches!(err, DecodeError::Field { field: "voting_end_time", .. }));
    }

    #[tokio::test]
    async fn test_fetch_follows_pagination() {
        let fetcher = MockFetcher::new();
        let base = "https://lcd.example";
        fetcher.respond(
            &format!("{URL}?proposal_status=2"),
            200,
            r#"{"proposals": [{"proposal_id": "1", "status": 2, "voting_end_time": "2026-01-01T00:00:00Z"}],
                "pagination": {"next_key": "AAE="}}"#,
        );
        fetcher.respond(
            &format!("{URL}?proposal_status=2&pagination.key=AAE="),
            200,
            r#"{"proposals": [{"proposal_id": "2", "status": 2, "voting_end_time": "2026-01-01T00:00:00Z"}],
                "pagination": {"next_key": null}}"#,
        );
        let proposals = fetch_active_proposals(&fetcher, base).await.unwrap();
        let ids: Vec<_> = proposals.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_fetch_not_found_is_a_failure() {
        let fetcher = MockFetcher::new();
        fetcher.respond(URL, 404, "Not Implemented");
        let err = fetch_active_proposals(&fetcher, "https://lcd.example")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WatchError::Fetch(govwatch_types::error::FetchError::Status { status: 404, .. })
        ));
    }
}
