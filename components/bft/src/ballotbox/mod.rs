//! Ballotbox: aggregates ballots into voteproofs, one vote record per (height, round, stage).
use crate::{
    error::BallotboxError,
    metrics::{self, METRICS},
    vote_records::VoteRecords,
};
use isaac_concurrency::{ctx, sync::watch};
use isaac_consensus_roles::validator::{self, Ballot, BallotError, Voteproof};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, RwLock},
};


/// Key of a vote record.
pub type RecordKey = (validator::Height, validator::Round, validator::Stage);

/// Collects ballots of all the (height, round, stage) the node is voting on.
///
/// `vote` may be called concurrently: the map of records is guarded by
/// a read-write lock which is held only to look up or insert a record,
/// and each record has a lock of its own.
///
/// Once a voteproof at (h, r) finishes, the records of every (h', r') < (h, r)
/// are superseded. They are purged lazily, at the start of the next call.
#[derive(Debug)]
pub struct Ballotbox {
    records: RwLock<HashMap<RecordKey, Arc<Mutex<VoteRecords>>>>,
    threshold: watch::Sender<validator::Threshold>,
    /// Highest (height, round) which finished since the last purge.
    pending_purge: Mutex<Option<(validator::Height, validator::Round)>>,
}

impl Ballotbox {
    /// Constructs an empty ballotbox which counts votes against `threshold`.
    pub fn new(threshold: validator::Threshold) -> Self {
        Self {
            records: RwLock::default(),
            threshold: watch::channel(threshold).0,
            pending_purge: Mutex::default(),
        }
    }

    /// Threshold new records are created with.
    pub fn threshold(&self) -> validator::Threshold {
        *self.threshold.borrow()
    }

    /// Sets the threshold for the records created from now on.
    /// Existing records keep counting against the threshold they were created with.
    pub fn set_threshold(&self, threshold: validator::Threshold) {
        self.threshold.send_if_modified(|t| {
            if *t == threshold {
                return false;
            }
            *t = threshold;
            true
        });
    }

    /// Counts `ballot` and returns the voteproof of its (height, round, stage).
    /// The returned voteproof may still be `NotYet`.
    ///
    /// The ballot is expected to have passed the `BallotChecker`; only its fact is checked here.
    pub fn vote(&self, ctx: &ctx::Ctx, ballot: &Ballot) -> Result<Voteproof, BallotboxError> {
        self.vote_and_report(ctx, ballot).map(|(vp, _)| vp)
    }

    /// Same as `vote`, but also tells whether this very call finished the voteproof.
    pub(crate) fn vote_and_report(
        &self,
        ctx: &ctx::Ctx,
        ballot: &Ballot,
    ) -> Result<(Voteproof, bool), BallotboxError> {
        let stage = ballot.stage();
        if !stage.can_vote() {
            return Err(BallotboxError::NotVotingStage(stage));
        }
        ballot
            .fact
            .validate()
            .map_err(|err| BallotboxError::InvalidBallot(err.into()))?;
        let want = ballot.fact.hash();
        if ballot.fact_hash != want {
            return Err(BallotboxError::InvalidBallot(
                BallotError::FactHashMismatch {
                    got: ballot.fact_hash,
                    want,
                },
            ));
        }

        self.purge();
        let key = (ballot.height(), ballot.round(), stage);
        let records = self.get_or_create(key);
        let (vp, finished) = {
            let mut records = records.lock().unwrap();
            let was_finished = records.is_finished();
            let vp = records.vote(ctx, ballot);
            (vp, !was_finished && records.is_finished())
        };
        METRICS.ballots_voted[&metrics::StageLabel::from(stage)].inc();

        if finished {
            tracing::info!(
                height = %key.0,
                round = %key.1,
                stage = %key.2,
                result = ?vp.result(),
                "voteproof finished",
            );
            METRICS.voteproofs_finished[&metrics::ResultLabel::from(vp.result())].inc();
            self.schedule_purge(key.0, key.1);
        }
        Ok((vp, finished))
    }

    /// Current voteproof of the record at `key`, if there is one.
    pub fn voteproof(&self, key: &RecordKey) -> Option<Voteproof> {
        self.purge();
        let records = self.records.read().unwrap().get(key).cloned()?;
        let vp = records.lock().unwrap().voteproof();
        Some(vp)
    }

    /// Whether there is a record at `key`.
    pub fn contains(&self, key: &RecordKey) -> bool {
        self.purge();
        self.records.read().unwrap().contains_key(key)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.purge();
        self.records.read().unwrap().len()
    }

    /// Runs the pending purge, if any.
    pub fn clean(&self) {
        self.purge();
    }

    fn get_or_create(&self, key: RecordKey) -> Arc<Mutex<VoteRecords>> {
        if let Some(records) = self.records.read().unwrap().get(&key) {
            return records.clone();
        }
        // Capture the threshold before taking the write lock.
        let threshold = self.threshold();
        let mut map = self.records.write().unwrap();
        let records = map
            .entry(key)
            .or_insert_with(|| {
                Arc::new(Mutex::new(VoteRecords::new(key.0, key.1, key.2, threshold)))
            })
            .clone();
        METRICS.ballotbox_records.set(map.len() as u64);
        records
    }

    fn schedule_purge(&self, height: validator::Height, round: validator::Round) {
        let mut pending = self.pending_purge.lock().unwrap();
        if pending.map_or(true, |p| p < (height, round)) {
            *pending = Some((height, round));
        }
    }

    /// Removes the records superseded by the last finished voteproof.
    /// Never takes the lock of a record.
    fn purge(&self) {
        if self.pending_purge.lock().unwrap().is_none() {
            return;
        }
        let mut map = self.records.write().unwrap();
        // Taken under the map lock: readers see either the pending purge or its result.
        let Some(top) = self.pending_purge.lock().unwrap().take() else {
            return;
        };
        let before = map.len();
        map.retain(|(height, round, _), _| (*height, *round) >= top);
        let purged = before - map.len();
        METRICS.ballotbox_records.set(map.len() as u64);
        METRICS.purged_records.inc_by(purged as u64);
        tracing::trace!(
            height = %top.0,
            round = %top.1,
            purged,
            "purged vote records",
        );
    }
}
