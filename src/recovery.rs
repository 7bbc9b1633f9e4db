//! Recovery policies for recoverable validation errors.
//!
//! The reader never decides on its own whether a count or control number
//! mismatch is acceptable. It hands each [`RecoverableError`] to the
//! caller's [`RecoveryPolicy`] exactly once and either carries on with the
//! next segment or turns the error into a fatal [`Error::Aborted`].
//!
//! Any `FnMut(&RecoverableError) -> bool` closure is a policy: `true` means
//! continue.
//!
//! ## Examples
//!
//! ```rust
//! use edi_stream::{Recovery, RecoveryPolicy, RecoverableError, RecoverableKind, Level};
//!
//! let mut seen = 0;
//! let mut policy = |_: &RecoverableError| {
//!     seen += 1;
//!     true
//! };
//! let err = RecoverableError::new(
//!     RecoverableKind::CountMismatch, Level::Document, "SE", "4", "5", 0,
//! );
//! assert_eq!(policy.recover(&err), Recovery::Continue);
//! ```

use crate::error::{Error, RecoverableError, Result};

/// A policy's verdict on one recoverable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    Continue,
    Abort,
}

/// Decides whether parsing continues past a recoverable error.
///
/// Called synchronously from inside the reader; it must not re-enter it.
pub trait RecoveryPolicy {
    fn recover(&mut self, error: &RecoverableError) -> Recovery;
}

impl<F> RecoveryPolicy for F
where
    F: FnMut(&RecoverableError) -> bool,
{
    fn recover(&mut self, error: &RecoverableError) -> Recovery {
        if self(error) {
            Recovery::Continue
        } else {
            Recovery::Abort
        }
    }
}

/// Aborts on every recoverable error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Strict;

impl RecoveryPolicy for Strict {
    fn recover(&mut self, _error: &RecoverableError) -> Recovery {
        Recovery::Abort
    }
}

/// Continues past every recoverable error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lenient;

impl RecoveryPolicy for Lenient {
    fn recover(&mut self, _error: &RecoverableError) -> Recovery {
        Recovery::Continue
    }
}

/// Mediates between the reader and a policy, remembering what was accepted.
pub(crate) struct ErrorClassifier<'p> {
    policy: &'p mut dyn RecoveryPolicy,
    accepted: &'p mut Vec<RecoverableError>,
}

impl<'p> ErrorClassifier<'p> {
    pub(crate) fn new(
        policy: &'p mut dyn RecoveryPolicy,
        accepted: &'p mut Vec<RecoverableError>,
    ) -> Self {
        ErrorClassifier { policy, accepted }
    }

    /// Offers `error` to the policy.
    ///
    /// `Ok(())` means parsing goes on; the error is recorded as accepted.
    pub(crate) fn offer(&mut self, error: RecoverableError) -> Result<()> {
        tracing::debug!(%error, "offering recoverable error to policy");
        match self.policy.recover(&error) {
            Recovery::Continue => {
                tracing::debug!(kind = %error.kind, "policy continued");
                self.accepted.push(error);
                Ok(())
            }
            Recovery::Abort => {
                tracing::debug!(kind = %error.kind, "policy aborted");
                Err(Error::Aborted(error))
            }
        }
    }
}
