//! Pitch lifecycle.
//!
//! ```text
//! draft ──► ready ──► sent ──► opened ──► replied ──► accepted
//!   ▲         │         │         │          │     └─► declined
//!   └─────────┘         └─────────┴──────────┴──────► accepted | declined
//! any non-terminal ──► archived
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum PitchStatus {
    Draft,
    Ready,
    Sent,
    Opened,
    Replied,
    Accepted,
    Declined,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PitchTransitionError {
    #[error("cannot move pitch from {from} to {to}")]
    NotAllowed { from: PitchStatus, to: PitchStatus },
    #[error("unknown pitch status: {0}")]
    UnknownStatus(String),
}

impl PitchStatus {
    pub const ALL: [PitchStatus; 8] = [
        Self::Draft,
        Self::Ready,
        Self::Sent,
        Self::Opened,
        Self::Replied,
        Self::Accepted,
        Self::Declined,
        Self::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Ready => "ready",
            Self::Sent => "sent",
            Self::Opened => "opened",
            Self::Replied => "replied",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Archived => "archived",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, PitchTransitionError> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == raw)
            .ok_or_else(|| PitchTransitionError::UnknownStatus(raw.to_string()))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Declined | Self::Archived)
    }

    /// Subject and body may only change before the pitch goes out.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Ready)
    }

    pub fn can_transition_to(&self, next: PitchStatus) -> bool {
        use PitchStatus::*;
        match (*self, next) {
            (from, Archived) => !from.is_terminal(),
            (Draft, Ready | Sent) => true,
            (Ready, Draft | Sent) => true,
            (Sent, Opened | Replied | Accepted | Declined) => true,
            (Opened, Replied | Accepted | Declined) => true,
            (Replied, Accepted | Declined) => true,
            _ => false,
        }
    }

    pub fn transition(self, next: PitchStatus) -> Result<PitchStatus, PitchTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(PitchTransitionError::NotAllowed {
                from: self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for PitchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_reject_everything() {
        for from in [
            PitchStatus::Accepted,
            PitchStatus::Declined,
            PitchStatus::Archived,
        ] {
            for to in PitchStatus::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn happy_path_reaches_accepted() {
        let status = PitchStatus::Draft
            .transition(PitchStatus::Ready)
            .and_then(|s| s.transition(PitchStatus::Sent))
            .and_then(|s| s.transition(PitchStatus::Opened))
            .and_then(|s| s.transition(PitchStatus::Replied))
            .and_then(|s| s.transition(PitchStatus::Accepted))
            .unwrap();
        assert_eq!(status, PitchStatus::Accepted);
    }

    #[test]
    fn cannot_skip_sending() {
        let err = PitchStatus::Draft
            .transition(PitchStatus::Replied)
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot move pitch from draft to replied");
        assert!(!PitchStatus::Sent.can_transition_to(PitchStatus::Draft));
    }

    #[test]
    fn any_open_state_can_be_archived() {
        for from in PitchStatus::ALL.into_iter().filter(|s| !s.is_terminal()) {
            assert!(from.can_transition_to(PitchStatus::Archived));
        }
    }

    #[test]
    fn editable_only_before_sending() {
        let editable: Vec<_> = PitchStatus::ALL
            .into_iter()
            .filter(PitchStatus::is_editable)
            .collect();
        assert_eq!(editable, vec![PitchStatus::Draft, PitchStatus::Ready]);
    }

    #[test]
    fn parse_matches_serde_names() {
        for status in PitchStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(PitchStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(PitchStatus::parse("bogus").is_err());
    }
}
