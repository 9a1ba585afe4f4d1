//! Test-only utilities.
use super::{
    AcceptFact, BallotHash, BlockHash, BodyHash, Fact, FactHash, Height, InitFact, Manifest,
    OperationHash, ProposalFact, ProposalHash, Round, SignFact, Stage, Threshold, VoteproofId,
};
use rand::{
    distributions::{Distribution, Standard},
    Rng,
};

impl Distribution<Height> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Height {
        Height(rng.gen_range(1..1000))
    }
}

impl Distribution<Round> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Round {
        Round(rng.gen_range(0..10))
    }
}

impl Distribution<Stage> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Stage {
        [Stage::Init, Stage::Sign, Stage::Accept][rng.gen_range(0..3)]
    }
}

impl Distribution<Threshold> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Threshold {
        let percent = [51., 67., 75., 100.][rng.gen_range(0..4)];
        Threshold::new(rng.gen_range(1..20), percent).unwrap()
    }
}

impl Distribution<FactHash> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> FactHash {
        FactHash(rng.gen())
    }
}

impl Distribution<BodyHash> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> BodyHash {
        BodyHash(rng.gen())
    }
}

impl Distribution<BallotHash> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> BallotHash {
        BallotHash(rng.gen())
    }
}

impl Distribution<BlockHash> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> BlockHash {
        BlockHash(rng.gen())
    }
}

impl Distribution<ProposalHash> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ProposalHash {
        ProposalHash(rng.gen())
    }
}

impl Distribution<OperationHash> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> OperationHash {
        OperationHash(rng.gen())
    }
}

impl Distribution<VoteproofId> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> VoteproofId {
        VoteproofId(rng.gen())
    }
}

impl Distribution<InitFact> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> InitFact {
        InitFact {
            height: rng.gen(),
            round: rng.gen(),
            previous_block: rng.gen(),
            previous_round: rng.gen(),
        }
    }
}

impl Distribution<SignFact> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SignFact {
        SignFact {
            height: rng.gen(),
            round: rng.gen(),
            proposal: rng.gen(),
            new_block: rng.gen(),
        }
    }
}

impl Distribution<AcceptFact> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> AcceptFact {
        AcceptFact {
            height: rng.gen(),
            round: rng.gen(),
            proposal: rng.gen(),
            new_block: rng.gen(),
        }
    }
}

impl Distribution<ProposalFact> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ProposalFact {
        let n = rng.gen_range(0..5);
        ProposalFact {
            height: rng.gen(),
            round: rng.gen(),
            operations: (0..n).map(|_| rng.gen()).collect(),
        }
    }
}

/// Generates a random fact of a voting stage.
impl Distribution<Fact> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Fact {
        match rng.gen::<Stage>() {
            Stage::Init => Fact::Init(rng.gen()),
            Stage::Sign => Fact::Sign(rng.gen()),
            _ => Fact::Accept(rng.gen()),
        }
    }
}

impl Distribution<Manifest> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Manifest {
        Manifest {
            height: rng.gen(),
            round: rng.gen(),
            proposal: rng.gen(),
            previous_block: rng.gen(),
        }
    }
}
