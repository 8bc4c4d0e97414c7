//! Coarse run status for polling observers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the current run stands. Progress events carry the detail;
/// this is the one-word answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Starting,
    Synthesizing,
    Synthesized,
    Planning,
    Planned,
    Deploying,
    Destroying,
    #[serde(rename = "output fetched")]
    OutputFetched,
    Done,
}

impl Default for Status {
    fn default() -> Self {
        Status::Starting
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Starting => "starting",
            Status::Synthesizing => "synthesizing",
            Status::Synthesized => "synthesized",
            Status::Planning => "planning",
            Status::Planned => "planned",
            Status::Deploying => "deploying",
            Status::Destroying => "destroying",
            Status::OutputFetched => "output fetched",
            Status::Done => "done",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_fetched_keeps_its_space_on_the_wire() {
        let json = serde_json::to_string(&Status::OutputFetched).unwrap();
        assert_eq!(json, r#""output fetched""#);
        assert_eq!(Status::OutputFetched.to_string(), "output fetched");
    }

    #[test]
    fn fresh_observers_start_at_starting() {
        assert_eq!(Status::default(), Status::Starting);
    }
}
