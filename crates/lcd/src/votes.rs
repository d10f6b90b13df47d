// Path: crates/lcd/src/votes.rs
use crate::fetcher::{join_url, FetchResponse, HttpFetcher};
use govwatch_telemetry::lcd_metrics;
use govwatch_types::{
    error::{DecodeError, WatchError},
    VoteRecord,
};
use serde::Deserialize;

/// Path of the vote cast by `voter` on `proposal_id`.
pub fn vote_path(proposal_id: &str, voter: &str) -> String {
    format!("/cosmos/gov/v1beta1/proposals/{proposal_id}/votes/{voter}")
}

const UNSPECIFIED: &str = "VOTE_OPTION_UNSPECIFIED";

#[derive(Deserialize)]
struct VoteResponse {
    vote: WireVote,
}

#[derive(Deserialize)]
struct WireVote {
    #[serde(default)]
    options: Vec<WireOption>,
    // Deprecated single-option field, still populated by older SDK releases.
    #[serde(default)]
    option: Option<OptionField>,
}

#[derive(Deserialize)]
struct WireOption {
    option: OptionField,
    #[serde(default)]
    weight: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OptionField {
    Code(i64),
    Name(String),
}

impl OptionField {
    fn canonical(&self) -> String {
        match self {
            Self::Code(c) => option_name(*c).to_string(),
            Self::Name(n) => match n.parse::<i64>() {
                Ok(c) => option_name(c).to_string(),
                Err(_) => n.clone(),
            },
        }
    }
}

fn option_name(code: i64) -> &'static str {
    match code {
        1 => "VOTE_OPTION_YES",
        2 => "VOTE_OPTION_ABSTAIN",
        3 => "VOTE_OPTION_NO",
        4 => "VOTE_OPTION_NO_WITH_VETO",
        _ => UNSPECIFIED,
    }
}

#[derive(Deserialize)]
struct GatewayError {
    #[serde(default)]
    message: String,
}

/// Whether a non-2xx reply means "this account has not voted".
///
/// Besides a plain 404, several SDK releases answer a missing vote through the
/// gRPC gateway with another 4xx and a message ending in `not found`. A 5xx is
/// never absence, whatever its body says.
fn is_vote_absent(resp: &FetchResponse) -> bool {
    if resp.is_not_found() {
        return true;
    }
    if !(400..500).contains(&resp.status) {
        return false;
    }
    serde_json::from_slice::<GatewayError>(&resp.body)
        .map(|e| e.message.to_ascii_lowercase().contains("not found"))
        .unwrap_or(false)
}

/// Decodes a 2xx vote body. An empty options list means no vote.
pub fn decode_vote(
    url: &str,
    proposal_id: &str,
    voter: &str,
    body: &[u8],
) -> Result<VoteRecord, DecodeError> {
    let resp: VoteResponse = serde_json::from_slice(body).map_err(|e| DecodeError::Json {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let mut chosen: Vec<String> = resp
        .vote
        .options
        .iter()
        .map(|o| {
            let name = o.option.canonical();
            match o.weight.as_deref() {
                Some(w) if resp.vote.options.len() > 1 => format!("{name}:{w}"),
                _ => name,
            }
        })
        .filter(|name| !name.starts_with(UNSPECIFIED))
        .collect();
    if chosen.is_empty() {
        if let Some(legacy) = resp.vote.option.as_ref().map(OptionField::canonical) {
            if legacy != UNSPECIFIED {
                chosen.push(legacy);
            }
        }
    }

    Ok(VoteRecord {
        proposal_id: proposal_id.to_string(),
        voter_address: voter.to_string(),
        option: if chosen.is_empty() {
            None
        } else {
            Some(chosen.join(","))
        },
    })
}

/// Looks up the vote of `account_address` on `proposal_id`.
///
/// Returns a record with `option == None` when the vote does not exist. Any
/// other failure is returned as an error and must not be read as "no vote".
pub async fn fetch_vote(
    fetcher: &dyn HttpFetcher,
    base_url: &str,
    proposal_id: &str,
    account_address: &str,
) -> Result<VoteRecord, WatchError> {
    let path = vote_path(proposal_id, account_address);
    let url = join_url(base_url, &path);
    let resp = fetcher.fetch(base_url, &path, &[]).await?;
    lcd_metrics().inc_requests_total("vote", resp.status);
    if resp.is_success() {
        return Ok(decode_vote(&url, proposal_id, account_address, &resp.body)?);
    }
    if is_vote_absent(&resp) {
        tracing::debug!(target: "lcd", %url, status = resp.status, "no vote recorded");
        return Ok(VoteRecord::absent(proposal_id, account_address));
    }
    Err(resp.into_status_error(url).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockFetcher, MockReply};
    use govwatch_types::error::FetchError;

    const BASE: &str = "https://lcd.example";
    const VOTER: &str = "cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu";

    fn url() -> String {
        join_url(BASE, &vote_path("42", VOTER))
    }

    #[test]
    fn test_decode_weighted_options() {
        let body = br#"{"vote": {"proposal_id": "42", "voter": "x", "option": "VOTE_OPTION_UNSPECIFIED",
            "options": [{"option": "VOTE_OPTION_YES", "weight": "1.000000000000000000"}]}}"#;
        let v = decode_vote("u", "42", VOTER, body).unwrap();
        assert_eq!(v.option.as_deref(), Some("VOTE_OPTION_YES"));
        assert!(v.has_voted());
    }

    #[test]
    fn test_decode_split_vote() {
        let body = br#"{"vote": {"options": [
            {"option": 1, "weight": "0.5"},
            {"option": "VOTE_OPTION_NO", "weight": "0.5"}]}}"#;
        let v = decode_vote("u", "42", VOTER, body).unwrap();
        assert_eq!(
            v.option.as_deref(),
            Some("VOTE_OPTION_YES:0.5,VOTE_OPTION_NO:0.5")
        );
    }

    #[test]
    fn test_decode_legacy_option_and_empty_options() {
        let legacy = br#"{"vote": {"option": "VOTE_OPTION_ABSTAIN", "options": []}}"#;
        let v = decode_vote("u", "42", VOTER, legacy).unwrap();
        assert_eq!(v.option.as_deref(), Some("VOTE_OPTION_ABSTAIN"));

        let empty = br#"{"vote": {"options": []}}"#;
        let v = decode_vote("u", "42", VOTER, empty).unwrap();
        assert!(!v.has_voted());
    }

    #[tokio::test]
    async fn test_not_found_is_absence() {
        let fetcher = MockFetcher::new();
        fetcher.respond(&url(), 404, "");
        let v = fetch_vote(&fetcher, BASE, "42", VOTER).await.unwrap();
        assert_eq!(v, VoteRecord::absent("42", VOTER));
    }

    #[tokio::test]
    async fn test_gateway_not_found_message_is_absence() {
        let fetcher = MockFetcher::new();
        fetcher.respond(
            &url(),
            400,
            r#"{"code": 3, "message": "voter: cosmos1... not found for proposal: 42: invalid argument", "details": []}"#,
        );
        let v = fetch_vote(&fetcher, BASE, "42", VOTER).await.unwrap();
        assert!(!v.has_voted());
    }

    #[tokio::test]
    async fn test_server_error_is_not_absence() {
        let fetcher = MockFetcher::new();
        fetcher.respond(&url(), 503, "upstream unavailable");
        let err = fetch_vote(&fetcher, BASE, "42", VOTER).await.unwrap_err();
        assert!(matches!(err, WatchError::Fetch(FetchError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_server_error_mentioning_not_found_is_not_absence() {
        let fetcher = MockFetcher::new();
        fetcher.respond(&url(), 503, r#"{"message": "upstream service not found"}"#);
        let err = fetch_vote(&fetcher, BASE, "42", VOTER).await.unwrap_err();
        assert!(matches!(err, WatchError::Fetch(FetchError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_timeout_is_not_absence() {
        let fetcher = MockFetcher::new();
        fetcher.reply(&url(), MockReply::Timeout);
        let err = fetch_vote(&fetcher, BASE, "42", VOTER).await.unwrap_err();
        assert!(matches!(err, WatchError::Fetch(FetchError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_decode_error() {
        let fetcher = MockFetcher::new();
        fetcher.respond(&url(), 200, "{\"vote\":");
        let err = fetch_vote(&fetcher, BASE, "42", VOTER).await.unwrap_err();
        assert!(matches!(err, WatchError::Decode(_)));
    }
}
