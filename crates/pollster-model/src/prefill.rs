use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// How a survey form is pre-filled for a returning participant.
///
/// The set of policies is closed and resolved when the survey document is
/// loaded; an unknown policy name is a load error, not a per-request lookup
/// failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PrefillPolicy {
    /// No prefill.
    #[default]
    None,
    /// Most recent prior submission by the same (user, person) pair from
    /// the survey's current live table.
    Last,
    /// Like `Last`, falling back to the `<table>_previousdata` side table
    /// of imported historical rows, tagged with its provenance.
    PreviousData,
}

impl PrefillPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrefillPolicy::None => "",
            PrefillPolicy::Last => "LAST",
            PrefillPolicy::PreviousData => "prefill_previous_data",
        }
    }
}

impl fmt::Display for PrefillPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PrefillPolicy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Ok(PrefillPolicy::None),
            "LAST" => Ok(PrefillPolicy::Last),
            "prefill_previous_data" => Ok(PrefillPolicy::PreviousData),
            other => Err(ModelError::UnknownPrefillPolicy(other.to_string())),
        }
    }
}

impl TryFrom<String> for PrefillPolicy {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PrefillPolicy> for String {
    fn from(policy: PrefillPolicy) -> Self {
        policy.as_str().to_string()
    }
}
