//! Local consensus policy.
use isaac_concurrency::time;
use isaac_consensus_roles::validator::{Threshold, ThresholdError};

/// Error returned when a policy value is out of range.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// A duration is shorter than 1ms.
    #[error("{field} must be at least 1ms, got {value}")]
    DurationTooShort {
        /// Name of the policy field.
        field: &'static str,
        /// Rejected value.
        value: time::Duration,
    },
    /// Threshold ratio or number of acting suffrage nodes is out of range.
    #[error("threshold: {0}")]
    Threshold(#[from] ThresholdError),
}

/// Parameters of the local node's consensus.
///
/// Durations are encoded as integer milliseconds. A decoded policy has to be
/// checked with `validate()`; the setters check the values themselves.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Policy {
    threshold_ratio: f64,
    number_of_acting_suffrage_nodes: u32,
    #[serde(rename = "timespan_valid_ballot_ms", with = "millis")]
    timespan_valid_ballot: time::Duration,
    #[serde(rename = "timeout_waiting_proposal_ms", with = "millis")]
    timeout_waiting_proposal: time::Duration,
    #[serde(rename = "interval_broadcasting_init_ballot_ms", with = "millis")]
    interval_broadcasting_init_ballot: time::Duration,
    #[serde(rename = "interval_broadcasting_proposal_ms", with = "millis")]
    interval_broadcasting_proposal: time::Duration,
    #[serde(rename = "wait_broadcasting_accept_ballot_ms", with = "millis")]
    wait_broadcasting_accept_ballot: time::Duration,
    #[serde(rename = "interval_broadcasting_accept_ballot_ms", with = "millis")]
    interval_broadcasting_accept_ballot: time::Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            threshold_ratio: 100.,
            number_of_acting_suffrage_nodes: 1,
            timespan_valid_ballot: time::Duration::minutes(1),
            timeout_waiting_proposal: time::Duration::seconds(5),
            interval_broadcasting_init_ballot: time::Duration::seconds(1),
            interval_broadcasting_proposal: time::Duration::seconds(1),
            wait_broadcasting_accept_ballot: time::Duration::seconds(1),
            interval_broadcasting_accept_ballot: time::Duration::seconds(1),
        }
    }
}

fn check_duration(field: &'static str, value: time::Duration) -> Result<(), PolicyError> {
    if value < time::Duration::milliseconds(1) {
        return Err(PolicyError::DurationTooShort { field, value });
    }
    Ok(())
}

macro_rules! duration_field {
    ($field:ident, $setter:ident, $doc:literal) => {
        #[doc = $doc]
        pub fn $field(&self) -> time::Duration {
            self.$field
        }

        #[doc = concat!("Sets `", stringify!($field), "`. Rejects durations below 1ms.")]
        pub fn $setter(&mut self, value: time::Duration) -> Result<&mut Self, PolicyError> {
            check_duration(stringify!($field), value)?;
            self.$field = value;
            Ok(self)
        }
    };
}

impl Policy {
    /// Percent of the acting suffrage required to agree.
    pub fn threshold_ratio(&self) -> f64 {
        self.threshold_ratio
    }

    /// Sets `threshold_ratio`. Rejects ratios outside of [1, 100].
    pub fn set_threshold_ratio(&mut self, ratio: f64) -> Result<&mut Self, PolicyError> {
        Threshold::new(self.number_of_acting_suffrage_nodes, ratio)?;
        self.threshold_ratio = ratio;
        Ok(self)
    }

    /// Number of nodes in the acting suffrage: the total of the threshold.
    pub fn number_of_acting_suffrage_nodes(&self) -> u32 {
        self.number_of_acting_suffrage_nodes
    }

    /// Sets `number_of_acting_suffrage_nodes`. Rejects 0.
    pub fn set_number_of_acting_suffrage_nodes(&mut self, n: u32) -> Result<&mut Self, PolicyError> {
        Threshold::new(n, self.threshold_ratio)?;
        self.number_of_acting_suffrage_nodes = n;
        Ok(self)
    }

    duration_field!(
        timespan_valid_ballot,
        set_timespan_valid_ballot,
        "Maximal distance between the signing time of a ballot and the local time."
    );
    duration_field!(
        timeout_waiting_proposal,
        set_timeout_waiting_proposal,
        "How long to wait for the proposal of a round."
    );
    duration_field!(
        interval_broadcasting_init_ballot,
        set_interval_broadcasting_init_ballot,
        "Interval of rebroadcasting INIT ballots."
    );
    duration_field!(
        interval_broadcasting_proposal,
        set_interval_broadcasting_proposal,
        "Interval of rebroadcasting proposals."
    );
    duration_field!(
        wait_broadcasting_accept_ballot,
        set_wait_broadcasting_accept_ballot,
        "Delay before broadcasting the first ACCEPT ballot."
    );
    duration_field!(
        interval_broadcasting_accept_ballot,
        set_interval_broadcasting_accept_ballot,
        "Interval of rebroadcasting ACCEPT ballots."
    );

    /// Threshold of the acting suffrage.
    pub fn threshold(&self) -> Result<Threshold, ThresholdError> {
        Threshold::new(self.number_of_acting_suffrage_nodes, self.threshold_ratio)
    }

    /// Checks every field of the policy.
    pub fn validate(&self) -> Result<(), PolicyError> {
        self.threshold()?;
        for (field, value) in [
            ("timespan_valid_ballot", self.timespan_valid_ballot),
            ("timeout_waiting_proposal", self.timeout_waiting_proposal),
            (
                "interval_broadcasting_init_ballot",
                self.interval_broadcasting_init_ballot,
            ),
            (
                "interval_broadcasting_proposal",
                self.interval_broadcasting_proposal,
            ),
            (
                "wait_broadcasting_accept_ballot",
                self.wait_broadcasting_accept_ballot,
            ),
            (
                "interval_broadcasting_accept_ballot",
                self.interval_broadcasting_accept_ballot,
            ),
        ] {
            check_duration(field, value)?;
        }
        Ok(())
    }
}

/// Serde encoding of durations as integer milliseconds.
mod millis {
    use isaac_concurrency::time;

    pub(super) fn serialize<S: serde::Serializer>(
        d: &time::Duration,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        let ms = i64::try_from(d.whole_milliseconds()).map_err(serde::ser::Error::custom)?;
        s.serialize_i64(ms)
    }

    pub(super) fn deserialize<'de, D: serde::Deserializer<'de>>(
        d: D,
    ) -> Result<time::Duration, D::Error> {
        let ms: i64 = serde::Deserialize::deserialize(d)?;
        Ok(time::Duration::milliseconds(ms))
    }
}
