//! Metrics for the ballot aggregation core.
use isaac_consensus_roles::validator;
use vise::{Counter, EncodeLabelValue, Gauge, LabeledFamily, Metrics};

/// Label for the stage of a ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EncodeLabelValue)]
#[metrics(rename_all = "snake_case")]
pub(crate) enum StageLabel {
    /// INIT ballot.
    Init,
    /// SIGN ballot.
    Sign,
    /// ACCEPT ballot.
    Accept,
    /// PROPOSAL ballot.
    Proposal,
}

impl From<validator::Stage> for StageLabel {
    fn from(stage: validator::Stage) -> Self {
        match stage {
            validator::Stage::Init => Self::Init,
            validator::Stage::Sign => Self::Sign,
            validator::Stage::Accept => Self::Accept,
            validator::Stage::Proposal => Self::Proposal,
        }
    }
}

/// Label for the result of a finished voteproof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EncodeLabelValue)]
#[metrics(rename_all = "snake_case")]
pub(crate) enum ResultLabel {
    NotYet,
    Draw,
    Majority,
}

impl From<validator::VoteResult> for ResultLabel {
    fn from(result: validator::VoteResult) -> Self {
        match result {
            validator::VoteResult::NotYet => Self::NotYet,
            validator::VoteResult::Draw => Self::Draw,
            validator::VoteResult::Majority => Self::Majority,
        }
    }
}

/// Reason a ballot was dropped before reaching the ballotbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EncodeLabelValue)]
#[metrics(rename_all = "snake_case")]
pub(crate) enum DropReason {
    /// Signed by the local node.
    FromLocal,
    /// Signed too far from the local time.
    OutOfTimespan,
    /// Voter is not in the suffrage.
    NotInSuffrage,
    /// Below the local state.
    Stale,
    /// Failed verification, or contradicts the local chain.
    Invalid,
}

/// Metrics defined by the ballot aggregation core.
#[derive(Debug, Metrics)]
#[metrics(prefix = "isaac_consensus")]
pub(crate) struct ConsensusMetrics {
    /// Ballots counted by the ballotbox, by stage.
    #[metrics(labels = ["stage"])]
    pub(crate) ballots_voted: LabeledFamily<StageLabel, Counter>,
    /// Voteproofs finished by the ballotbox, by result.
    #[metrics(labels = ["result"])]
    pub(crate) voteproofs_finished: LabeledFamily<ResultLabel, Counter>,
    /// Ballots dropped by the ballot checker, by reason.
    #[metrics(labels = ["reason"])]
    pub(crate) ballots_dropped: LabeledFamily<DropReason, Counter>,
    /// Number of vote records kept in the ballotbox.
    pub(crate) ballotbox_records: Gauge<u64>,
    /// Number of vote records purged from the ballotbox.
    pub(crate) purged_records: Counter,
}

/// Global instance of [`ConsensusMetrics`].
#[vise::register]
pub(crate) static METRICS: vise::Global<ConsensusMetrics> = vise::Global::new();
