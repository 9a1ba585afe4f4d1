//! Configuration of the local node.
use crate::policy::Policy;
use anyhow::Context as _;
use isaac_concurrency::time;
use isaac_consensus_roles::{node, validator};

/// Configuration of the ballot aggregation core.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// Network the node takes part in. Mixed into every signature.
    pub network_id: validator::NetworkId,
    /// The validator's secret key.
    pub secret_key: validator::SecretKey,
    /// Address of the local node.
    pub address: node::Address,
    /// Local consensus policy.
    #[serde(default)]
    pub policy: Policy,
}

impl Config {
    /// Decodes the config from JSON and validates the policy.
    pub fn decode_json(json: &str) -> anyhow::Result<Self> {
        let cfg: Self = serde_json::from_str(json).context("serde_json::from_str()")?;
        cfg.policy.validate().context("policy.validate()")?;
        Ok(cfg)
    }

    /// Encodes the config to JSON.
    pub fn encode_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("serde_json::to_string_pretty()")
    }

    /// The validator's public key.
    pub fn public_key(&self) -> validator::PublicKey {
        self.secret_key.public()
    }

    /// Signs a ballot of the local node.
    pub fn sign_ballot(
        &self,
        fact: validator::Fact,
        voteproof: Option<validator::Voteproof>,
        signed_at: time::Utc,
    ) -> validator::Ballot {
        validator::Ballot::new(
            &self.secret_key,
            self.address.clone(),
            fact,
            voteproof,
            signed_at,
            &self.network_id,
        )
    }
}
