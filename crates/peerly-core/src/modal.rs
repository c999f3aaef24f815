// ── Modal state machine ──
//
//   closed ─open─▶ open ─submit─▶ submitting ─ok─▶ closed
//                   ▲                  │
//                   └──────fail────────┘
//   open ─cancel─▶ closed

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ModalPhase {
    Closed,
    /// Open and editable; `error` is the last submission failure.
    Open { error: Option<String> },
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModalError {
    #[error("no dialog is open")]
    NotOpen,
    #[error("a submission is already in flight")]
    AlreadySubmitting,
}

/// One modal slot. `K` says what the modal is for (create, edit or
/// delete a given record).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal<K> {
    phase: ModalPhase,
    kind: Option<K>,
}

impl<K> Default for Modal<K> {
    fn default() -> Self {
        Self {
            phase: ModalPhase::Closed,
            kind: None,
        }
    }
}

impl<K> Modal<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &ModalPhase {
        &self.phase
    }

    pub fn kind(&self) -> Option<&K> {
        self.kind.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self.phase, ModalPhase::Closed)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.phase, ModalPhase::Submitting)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            ModalPhase::Open { error } => error.as_deref(),
            _ => None,
        }
    }

    /// Open for `kind`, replacing whatever was open.
    pub fn open(&mut self, kind: K) {
        self.kind = Some(kind);
        self.phase = ModalPhase::Open { error: None };
    }

    /// Enter `submitting`. Rejected while closed or already submitting.
    pub fn begin_submit(&mut self) -> Result<&K, ModalError> {
        match self.phase {
            ModalPhase::Closed => Err(ModalError::NotOpen),
            ModalPhase::Submitting => Err(ModalError::AlreadySubmitting),
            ModalPhase::Open { .. } => {
                self.phase = ModalPhase::Submitting;
                self.kind.as_ref().ok_or(ModalError::NotOpen)
            }
        }
    }

    /// Submission succeeded; close and hand back what was open.
    pub fn succeed(&mut self) -> Option<K> {
        self.phase = ModalPhase::Closed;
        self.kind.take()
    }

    /// Submission failed; reopen with the error shown inline.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.kind.is_some() {
            self.phase = ModalPhase::Open {
                error: Some(message.into()),
            };
        }
    }

    /// Close without submitting. Ignored mid-submission.
    pub fn cancel(&mut self) -> bool {
        if matches!(self.phase, ModalPhase::Open { .. }) {
            self.phase = ModalPhase::Closed;
            self.kind = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_closes() {
        let mut modal = Modal::new();
        modal.open("delete 7");
        assert_eq!(modal.begin_submit(), Ok(&"delete 7"));
        assert_eq!(modal.succeed(), Some("delete 7"));
        assert!(!modal.is_visible());
    }

    #[test]
    fn second_submit_is_rejected() {
        let mut modal = Modal::new();
        modal.open(1);
        modal.begin_submit().unwrap();
        assert_eq!(modal.begin_submit(), Err(ModalError::AlreadySubmitting));
    }

    #[test]
    fn failure_reopens_with_error() {
        let mut modal = Modal::new();
        modal.open(1);
        modal.begin_submit().unwrap();
        modal.fail("Name has already been taken");
        assert_eq!(modal.error(), Some("Name has already been taken"));
        assert!(modal.begin_submit().is_ok());
    }

    #[test]
    fn cancel_only_from_open() {
        let mut modal: Modal<i32> = Modal::new();
        assert!(!modal.cancel());
        modal.open(1);
        modal.begin_submit().unwrap();
        assert!(!modal.cancel());
        modal.fail("x");
        assert!(modal.cancel());
        assert_eq!(modal.phase(), &ModalPhase::Closed);
    }

    #[test]
    fn submit_when_closed_fails() {
        let mut modal: Modal<i32> = Modal::new();
        assert_eq!(modal.begin_submit(), Err(ModalError::NotOpen));
    }
}
