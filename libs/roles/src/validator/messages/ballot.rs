//! Ballots: signed votes of a validator.
use super::{
    BallotHash, BodyHash, Fact, FactError, FactHash, Height, NetworkId, Round, Stage,
    VoteproofError, VoteproofNodeFact, Voteproof,
};
use crate::{
    node,
    validator::{InvalidSignatureError, PublicKey, SecretKey, Signature},
};
use isaac_concurrency::time;
use isaac_consensus_crypto::TextFmt as _;

/// Error returned when a ballot is invalid.
#[derive(Debug, thiserror::Error)]
pub enum BallotError {
    /// The ballot has no signing time.
    #[error("missing signed_at")]
    MissingSignedAt,
    /// The ballot was signed too far from the current time.
    #[error("signed_at {signed_at:?} is more than {timespan} away from now ({now:?})")]
    OutOfTimespan {
        /// Signing time of the ballot.
        signed_at: time::Utc,
        /// Current time.
        now: time::Utc,
        /// Allowed distance.
        timespan: time::Duration,
    },
    /// The fact is malformed.
    #[error("fact: {0}")]
    InvalidFact(#[from] FactError),
    /// `fact_hash` is not the hash of the fact.
    #[error("fact hash mismatch: got {got:?}, want {want:?}")]
    FactHashMismatch {
        /// Stored hash.
        got: FactHash,
        /// Recomputed hash.
        want: FactHash,
    },
    /// Fact signature is invalid.
    #[error("fact signature: {0}")]
    InvalidFactSignature(#[source] InvalidSignatureError),
    /// `body_hash` is not the hash of the body.
    #[error("body hash mismatch: got {got:?}, want {want:?}")]
    BodyHashMismatch {
        /// Stored hash.
        got: BodyHash,
        /// Recomputed hash.
        want: BodyHash,
    },
    /// Body signature is invalid.
    #[error("signature: {0}")]
    InvalidSignature(#[source] InvalidSignatureError),
    /// `hash` is not the hash of the envelope.
    #[error("ballot hash mismatch: got {got:?}, want {want:?}")]
    HashMismatch {
        /// Stored hash.
        got: BallotHash,
        /// Recomputed hash.
        want: BallotHash,
    },
    /// An INIT or ACCEPT ballot without a voteproof.
    #[error("{0} ballot without voteproof")]
    MissingVoteproof(Stage),
    /// The embedded voteproof is invalid.
    #[error("voteproof: {0}")]
    InvalidVoteproof(#[source] VoteproofError),
    /// The embedded voteproof has an unexpected stage.
    #[error("{ballot} ballot carries {voteproof} voteproof")]
    VoteproofStage {
        /// Stage of the ballot.
        ballot: Stage,
        /// Stage of the voteproof.
        voteproof: Stage,
    },
    /// The embedded voteproof has an unexpected height.
    #[error("ballot at height {ballot} carries voteproof at height {voteproof}")]
    VoteproofHeight {
        /// Height of the ballot.
        ballot: Height,
        /// Height of the voteproof.
        voteproof: Height,
    },
}

/// Ballot: a vote of `node` at (height, round, stage) for `fact`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Ballot {
    /// Voter.
    pub node: node::Address,
    /// What the voter votes for.
    pub fact: Fact,
    /// Hash of `fact`.
    pub fact_hash: FactHash,
    /// Signature of `fact_hash ∥ network_id`.
    pub fact_signature: Signature,
    /// Key of the voter.
    pub signer: PublicKey,
    /// Hash of `fact ∥ voteproof`.
    pub body_hash: BodyHash,
    /// Signature of `body_hash ∥ network_id`.
    pub signature: Signature,
    /// Time the ballot was signed at.
    pub signed_at: time::Utc,
    /// Hash of the whole envelope.
    pub hash: BallotHash,
    /// Voteproof justifying the ballot: the last ACCEPT voteproof for INIT ballots,
    /// the INIT voteproof of the round for ACCEPT ballots.
    pub voteproof: Option<Voteproof>,
}

impl Ballot {
    /// Signs a ballot for `fact` as `node`.
    pub fn new(
        key: &SecretKey,
        node: node::Address,
        fact: Fact,
        voteproof: Option<Voteproof>,
        signed_at: time::Utc,
        network_id: &NetworkId,
    ) -> Self {
        let fact_hash = fact.hash();
        let fact_signature = key.sign(fact_hash.as_bytes(), network_id);
        let body_hash = Self::body_hash_of(&fact, voteproof.as_ref());
        let signature = key.sign(body_hash.as_bytes(), network_id);
        let mut this = Self {
            node,
            fact,
            fact_hash,
            fact_signature,
            signer: key.public(),
            body_hash,
            signature,
            signed_at,
            hash: BallotHash::default(),
            voteproof,
        };
        this.hash = this.compute_hash();
        this
    }

    /// Stage of the ballot.
    pub fn stage(&self) -> Stage {
        self.fact.stage()
    }

    /// Height of the ballot.
    pub fn height(&self) -> Height {
        self.fact.height()
    }

    /// Round of the ballot.
    pub fn round(&self) -> Round {
        self.fact.round()
    }

    /// Evidence of this vote, as stored in voteproofs.
    pub fn vote(&self) -> VoteproofNodeFact {
        VoteproofNodeFact {
            node: self.node.clone(),
            fact: self.fact_hash,
            fact_signature: self.fact_signature.clone(),
            signer: self.signer,
        }
    }

    fn body_hash_of(fact: &Fact, voteproof: Option<&Voteproof>) -> BodyHash {
        let vp = voteproof.map(Voteproof::to_bytes).unwrap_or_default();
        BodyHash::concat([&fact.to_bytes()[..], &vp])
    }

    /// Canonical encoding of the envelope:
    /// `body_hash ∥ signer ∥ signature ∥ RFC3339(signed_at) ∥ node`.
    pub fn envelope_bytes(&self) -> Vec<u8> {
        [
            &self.body_hash.as_bytes()[..],
            self.signer.encode().as_bytes(),
            &self.signature.to_bytes(),
            self.signed_at.to_string().as_bytes(),
            self.node.as_bytes(),
        ]
        .concat()
    }

    fn compute_hash(&self) -> BallotHash {
        BallotHash::concat([
            &self.envelope_bytes()[..],
            self.fact_hash.as_bytes(),
            &self.fact_signature.to_bytes(),
        ])
    }

    /// Checks that `signed_at` is within `timespan` from `now`.
    pub fn verify_signed_at(
        &self,
        now: time::Utc,
        timespan: time::Duration,
    ) -> Result<(), BallotError> {
        if self.signed_at.is_zero() {
            return Err(BallotError::MissingSignedAt);
        }
        if (now - self.signed_at).abs() > timespan {
            return Err(BallotError::OutOfTimespan {
                signed_at: self.signed_at,
                now,
                timespan,
            });
        }
        Ok(())
    }

    /// Verifies the ballot: its fact, hashes and signatures, and the embedded voteproof.
    /// The signing time is checked against the local clock separately, by `verify_signed_at`.
    pub fn verify(&self, network_id: &NetworkId) -> Result<(), BallotError> {
        if self.signed_at.is_zero() {
            return Err(BallotError::MissingSignedAt);
        }
        self.fact.validate()?;

        let want = self.fact.hash();
        if self.fact_hash != want {
            return Err(BallotError::FactHashMismatch {
                got: self.fact_hash,
                want,
            });
        }
        self.fact_signature
            .verify(self.fact_hash.as_bytes(), network_id, &self.signer)
            .map_err(BallotError::InvalidFactSignature)?;

        let want = Self::body_hash_of(&self.fact, self.voteproof.as_ref());
        if self.body_hash != want {
            return Err(BallotError::BodyHashMismatch {
                got: self.body_hash,
                want,
            });
        }
        self.signature
            .verify(self.body_hash.as_bytes(), network_id, &self.signer)
            .map_err(BallotError::InvalidSignature)?;

        let want = self.compute_hash();
        if self.hash != want {
            return Err(BallotError::HashMismatch {
                got: self.hash,
                want,
            });
        }

        self.verify_voteproof(network_id)
    }

    fn verify_voteproof(&self, network_id: &NetworkId) -> Result<(), BallotError> {
        let Some(vp) = &self.voteproof else {
            return match self.stage() {
                Stage::Init | Stage::Accept => Err(BallotError::MissingVoteproof(self.stage())),
                Stage::Sign | Stage::Proposal => Ok(()),
            };
        };
        vp.verify(network_id)
            .map_err(BallotError::InvalidVoteproof)?;
        let (want_stage, want_height) = match self.stage() {
            Stage::Init => (Stage::Accept, self.height().prev()),
            Stage::Accept => (Stage::Init, Some(self.height())),
            Stage::Sign | Stage::Proposal => return Ok(()),
        };
        if vp.stage() != want_stage {
            return Err(BallotError::VoteproofStage {
                ballot: self.stage(),
                voteproof: vp.stage(),
            });
        }
        if Some(vp.height()) != want_height {
            return Err(BallotError::VoteproofHeight {
                ballot: self.height(),
                voteproof: vp.height(),
            });
        }
        Ok(())
    }
}
