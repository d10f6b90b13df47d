// Path: crates/alerting/src/policy.rs
use govwatch_types::{Proposal, VoteRecord};
use time::{Duration, OffsetDateTime};

/// The outcome of evaluating one (validator, proposal) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The proposal is not in its voting period.
    NotVoting,
    /// The validator has voted. Any pending dedup entry can be dropped.
    Voted,
    /// The deadline has passed. Alerts are never raised retroactively.
    Closed,
    /// The deadline is further away than the alert window.
    NotYetDue { remaining: Duration },
    /// Inside the window, but this voting period was already alerted.
    AlreadyAlerted { remaining: Duration },
    /// Inside the window and not yet alerted: send an alert.
    Alert { remaining: Duration },
}

/// Decides when an unvoted proposal becomes alert-worthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    /// Alert once `0 < remaining <= window`.
    pub window: Duration,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            window: Duration::hours(24),
        }
    }
}

impl AlertPolicy {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn decide(
        &self,
        proposal: &Proposal,
        vote: &VoteRecord,
        already_alerted: bool,
        now: OffsetDateTime,
    ) -> Decision {
        if !proposal.is_voting() {
            return Decision::NotVoting;
        }
        if vote.has_voted() {
            return Decision::Voted;
        }
        let remaining = proposal.voting_end_time - now;
        if remaining <= Duration::ZERO {
            return Decision::Closed;
        }
        if remaining > self.window {
            return Decision::NotYetDue { remaining };
        }
        if already_alerted {
            return Decision::AlreadyAlerted { remaining };
        }
        Decision::Alert { remaining }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govwatch_types::ProposalStatus;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2026-10-15 12:00 UTC);

    fn proposal(status: ProposalStatus, ends_in: Duration) -> Proposal {
        Proposal {
            id: "42".into(),
            voting_end_time: NOW + ends_in,
            status,
            title: None,
        }
    }

    fn no_vote() -> VoteRecord {
        VoteRecord::absent("42", "cosmos1abc")
    }

    fn voted() -> VoteRecord {
        VoteRecord {
            option: Some("VOTE_OPTION_YES".into()),
            ..no_vote()
        }
    }

    #[test]
    fn test_non_voting_status_never_alerts() {
        let policy = AlertPolicy::default();
        for status in [
            ProposalStatus::DepositPeriod,
            ProposalStatus::Passed,
            ProposalStatus::Rejected,
            ProposalStatus::Failed,
            ProposalStatus::Unspecified,
        ] {
            let p = proposal(status, Duration::hours(1));
            assert_eq!(policy.decide(&p, &no_vote(), false, NOW), Decision::NotVoting);
        }
    }

    #[test]
    fn test_voted_never_alerts() {
        let p = proposal(ProposalStatus::VotingPeriod, Duration::hours(1));
        assert_eq!(
            AlertPolicy::default().decide(&p, &voted(), false, NOW),
            Decision::Voted
        );
    }

    #[test]
    fn test_window_boundaries() {
        let policy = AlertPolicy::default();
        let at_window = proposal(ProposalStatus::VotingPeriod, Duration::hours(24));
        assert_eq!(
            policy.decide(&at_window, &no_vote(), false, NOW),
            Decision::Alert {
                remaining: Duration::hours(24)
            }
        );

        let past_window = proposal(
            ProposalStatus::VotingPeriod,
            Duration::hours(24) + Duration::SECOND,
        );
        assert!(matches!(
            policy.decide(&past_window, &no_vote(), false, NOW),
            Decision::NotYetDue { .. }
        ));

        let closing_now = proposal(ProposalStatus::VotingPeriod, Duration::ZERO);
        assert_eq!(
            policy.decide(&closing_now, &no_vote(), false, NOW),
            Decision::Closed
        );

        let closed = proposal(ProposalStatus::VotingPeriod, -Duration::hours(1));
        assert_eq!(policy.decide(&closed, &no_vote(), false, NOW), Decision::Closed);
    }

    #[test]
    fn test_already_alerted_is_suppressed() {
        let p = proposal(ProposalStatus::VotingPeriod, Duration::hours(10));
        assert_eq!(
            AlertPolicy::default().decide(&p, &no_vote(), true, NOW),
            Decision::AlreadyAlerted {
                remaining: Duration::hours(10)
            }
        );
    }

    #[test]
    fn test_custom_window() {
        let policy = AlertPolicy::new(Duration::hours(2));
        let p = proposal(ProposalStatus::VotingPeriod, Duration::hours(3));
        assert!(matches!(
            policy.decide(&p, &no_vote(), false, NOW),
            Decision::NotYetDue { .. }
        ));
    }
}
