//! Property-based tests for session admission.

use chrono::{Duration, Utc};
use parcel_shared::{SessionId, WidgetIdentity};
use proptest::prelude::*;

use crate::upload::error::UploadError;
use crate::upload::types::{Session, SessionState};

fn open_session(limit: u64) -> Session {
    let now = Utc::now();
    Session {
        id: SessionId::from_raw(1),
        widget: WidgetIdentity::new("inst", "comp"),
        state: SessionState::Open,
        upload_size_limit: limit,
        accumulated_size: 0,
        created_at: now,
        expires_at: now + Duration::hours(1),
    }
}

/// Apply a sequence of registrations the way a store does: admit, then grow.
fn replay(session: &mut Session, sizes: &[u64]) -> Vec<Result<(), UploadError>> {
    let now = Utc::now();
    sizes
        .iter()
        .map(|&size| {
            let outcome = session.check_admission(size, now);
            if outcome.is_ok() {
                session.accumulated_size += size;
            }
            outcome
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The accumulated size never exceeds the ceiling, whatever arrives.
    #[test]
    fn prop_accumulated_never_exceeds_limit(
        limit in 1u64..10_000_000,
        sizes in prop::collection::vec(1u64..12_000_000, 0..20),
    ) {
        let mut session = open_session(limit);
        replay(&mut session, &sizes);
        prop_assert!(session.accumulated_size <= session.upload_size_limit);
    }

    /// A rejected file leaves the accumulated size untouched.
    #[test]
    fn prop_rejection_has_no_effect(
        limit in 1u64..1_000_000,
        sizes in prop::collection::vec(1u64..2_000_000, 1..20),
    ) {
        let mut session = open_session(limit);
        let now = Utc::now();
        for size in sizes {
            let before = session.accumulated_size;
            match session.check_admission(size, now) {
                Ok(()) => session.accumulated_size += size,
                Err(UploadError::FileTooLarge { .. }) => {
                    prop_assert_eq!(session.accumulated_size, before);
                }
                Err(other) => prop_assert!(false, "unexpected error {other:?}"),
            }
        }
    }

    /// A file at or above the ceiling is never admitted, even into an empty session.
    #[test]
    fn prop_file_at_limit_is_too_large(limit in 1u64..u64::MAX / 2, extra in 0u64..1_000) {
        let session = open_session(limit);
        let result = session.check_admission(limit + extra, Utc::now());
        let rejected = matches!(result, Err(UploadError::FileTooLarge { .. }));
        prop_assert!(rejected);
    }

    /// Every admitted total is exactly the sum of the accepted sizes.
    #[test]
    fn prop_accumulated_is_sum_of_accepted(
        limit in 1u64..5_000_000,
        sizes in prop::collection::vec(1u64..1_000_000, 0..30),
    ) {
        let mut session = open_session(limit);
        let outcomes = replay(&mut session, &sizes);
        let accepted: u64 = sizes
            .iter()
            .zip(&outcomes)
            .filter(|(_, o)| o.is_ok())
            .map(|(s, _)| *s)
            .sum();
        prop_assert_eq!(session.accumulated_size, accepted);
    }

    /// Terminal sessions admit nothing.
    #[test]
    fn prop_terminal_sessions_reject(
        size in 1u64..1_000,
        committed in any::<bool>(),
    ) {
        let mut session = open_session(1_000_000);
        session.state = if committed { SessionState::Committed } else { SessionState::Expired };
        let result = session.check_admission(size, Utc::now());
        let expected_kind = if committed { "already-committed" } else { "session-expired" };
        prop_assert_eq!(result.unwrap_err().kind(), expected_kind);
    }
}
