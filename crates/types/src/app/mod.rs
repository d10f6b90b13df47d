// Path: crates/types/src/app/mod.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// A validator identity registered for monitoring on a specific chain.
///
/// `address` is the bech32 validator-operator address (`<prefix>valoper1...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Validator {
    /// The chain registry name of the network (e.g. `cosmoshub`).
    #[serde(alias = "chain")]
    pub chain_name: String,
    /// The validator-operator address.
    pub address: String,
}

impl Validator {
    /// Creates a new monitored validator entry.
    pub fn new(chain_name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            chain_name: chain_name.into(),
            address: address.into(),
        }
    }
}

/// A candidate LCD base URL together with the outcome of its health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEndpoint {
    /// The REST base URL without a trailing slash.
    pub base_url: String,
    /// Whether the last reachability probe succeeded.
    pub healthy: bool,
}

/// Lifecycle phase of a governance proposal, mirroring the Cosmos SDK enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Status not set or not recognised.
    Unspecified,
    /// Proposal is collecting its minimum deposit.
    DepositPeriod,
    /// Proposal is open for votes.
    VotingPeriod,
    /// Voting closed and the proposal passed.
    Passed,
    /// Voting closed and the proposal was rejected.
    Rejected,
    /// The proposal passed but failed to execute.
    Failed,
}

impl ProposalStatus {
    /// Maps the numeric protobuf code to a status.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::DepositPeriod,
            2 => Self::VotingPeriod,
            3 => Self::Passed,
            4 => Self::Rejected,
            5 => Self::Failed,
            _ => Self::Unspecified,
        }
    }

    /// Maps either the protobuf enum name (`PROPOSAL_STATUS_VOTING_PERIOD`) or
    /// a decimal code (`"2"`) to a status.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if let Ok(code) = name.parse::<i64>() {
            return Self::from_code(code);
        }
        match name.trim_start_matches("PROPOSAL_STATUS_") {
            "DEPOSIT_PERIOD" => Self::DepositPeriod,
            "VOTING_PERIOD" => Self::VotingPeriod,
            "PASSED" => Self::Passed,
            "REJECTED" => Self::Rejected,
            "FAILED" => Self::Failed,
            _ => Self::Unspecified,
        }
    }

    /// The numeric code used by the `proposal_status` query parameter.
    pub fn code(&self) -> i64 {
        match self {
            Self::Unspecified => 0,
            Self::DepositPeriod => 1,
            Self::VotingPeriod => 2,
            Self::Passed => 3,
            Self::Rejected => 4,
            Self::Failed => 5,
        }
    }
}

/// A governance proposal as returned by the active-proposals resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    /// The proposal identifier, kept as the decimal string the chain returns.
    pub id: String,
    /// The instant at which voting closes.
    pub voting_end_time: OffsetDateTime,
    /// The lifecycle phase reported by the chain.
    pub status: ProposalStatus,
    /// The proposal title, when the chain includes one in the listing.
    pub title: Option<String>,
}

impl Proposal {
    /// Returns true when votes may currently be cast on this proposal.
    pub fn is_voting(&self) -> bool {
        self.status == ProposalStatus::VotingPeriod
    }
}

/// The vote state of one account on one proposal.
///
/// `option == None` is the explicit "not yet voted" result. It is only ever
/// produced from a successful lookup or a not-found response, never from a
/// failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRecord {
    /// The proposal the vote belongs to.
    pub proposal_id: String,
    /// The account address that was queried.
    pub voter_address: String,
    /// The vote option (e.g. `VOTE_OPTION_YES`), if one was cast.
    pub option: Option<String>,
}

impl VoteRecord {
    /// A record signalling that no vote has been cast.
    pub fn absent(proposal_id: impl Into<String>, voter_address: impl Into<String>) -> Self {
        Self {
            proposal_id: proposal_id.into(),
            voter_address: voter_address.into(),
            option: None,
        }
    }

    /// Returns true when a vote option is present.
    pub fn has_voted(&self) -> bool {
        self.option.is_some()
    }
}

/// Identifies one validator's pending obligation on one proposal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlertKey {
    /// Chain the proposal lives on.
    pub chain_name: String,
    /// The monitored validator-operator address.
    pub validator_address: String,
    /// The proposal identifier.
    pub proposal_id: String,
}

impl AlertKey {
    /// Derives the key for a validator and proposal pair.
    pub fn new(validator: &Validator, proposal_id: &str) -> Self {
        Self {
            chain_name: validator.chain_name.clone(),
            validator_address: validator.address.clone(),
            proposal_id: proposal_id.to_string(),
        }
    }
}

impl fmt::Display for AlertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.chain_name, self.validator_address, self.proposal_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_name_and_code() {
        assert_eq!(
            ProposalStatus::from_name("PROPOSAL_STATUS_VOTING_PERIOD"),
            ProposalStatus::VotingPeriod
        );
        assert_eq!(ProposalStatus::from_name("2"), ProposalStatus::VotingPeriod);
        assert_eq!(ProposalStatus::from_name("PASSED"), ProposalStatus::Passed);
        assert_eq!(ProposalStatus::from_name("bogus"), ProposalStatus::Unspecified);
        assert_eq!(ProposalStatus::from_code(1), ProposalStatus::DepositPeriod);
        assert_eq!(ProposalStatus::from_code(42), ProposalStatus::Unspecified);
        assert_eq!(ProposalStatus::VotingPeriod.code(), 2);
    }

    #[test]
    fn test_alert_key_display() {
        let v = Validator::new("cosmoshub", "cosmosvaloper1abc");
        let key = AlertKey::new(&v, "42");
        assert_eq!(key.to_string(), "cosmoshub/cosmosvaloper1abc/42");
    }

    #[test]
    fn test_vote_record_absent() {
        let v = VoteRecord::absent("7", "cosmos1abc");
        assert!(!v.has_voted());
    }
}
