//! Property-based tests for status derivation.
//!
//! Status derivation is a pure function of a single sensor reading, so it is
//! checked against its defining intervals over the whole input domain.

use proptest::prelude::*;
use turnlock_core::{Color, LockStatus, StatusEdge};

/// Strategy for generating any color reading.
fn any_color() -> impl Strategy<Value = Color> {
    prop_oneof![Just(Color::Blue), Just(Color::Red), Just(Color::Other)]
}

/// Strategy for generating any lock status.
fn any_status() -> impl Strategy<Value = LockStatus> {
    prop_oneof![
        Just(LockStatus::Open),
        Just(LockStatus::Closed),
        Just(LockStatus::Unknown),
    ]
}

proptest! {
    /// Property: the key is OPEN exactly inside (-65, -35), CLOSED exactly
    /// inside (-15, 15), and UNKNOWN everywhere else.
    #[test]
    fn prop_key_status_matches_intervals(angle in -2_000i32..2_000i32) {
        let status = LockStatus::from_key_angle(angle);

        prop_assert_eq!(status == LockStatus::Open, angle > -65 && angle < -35);
        prop_assert_eq!(status == LockStatus::Closed, angle > -15 && angle < 15);
        prop_assert_eq!(
            status == LockStatus::Unknown,
            !(angle > -65 && angle < -35) && !(angle > -15 && angle < 15)
        );
    }

    /// Property: the thumbturn is CLOSED iff blue and OPEN iff red.
    #[test]
    fn prop_thumb_turn_status_matches_color(color in any_color()) {
        let status = LockStatus::from_color(color);

        prop_assert_eq!(status == LockStatus::Closed, color == Color::Blue);
        prop_assert_eq!(status == LockStatus::Open, color == Color::Red);
    }

    /// Property: an edge exists only when exactly one side is CLOSED.
    #[test]
    fn prop_edges_require_closed_on_one_side(old in any_status(), new in any_status()) {
        let edge = StatusEdge::between(old, new);
        let crosses = (old == LockStatus::Closed) != (new == LockStatus::Closed);

        prop_assert_eq!(edge.is_some(), crosses);
        if let Some(edge) = edge {
            prop_assert_eq!(edge == StatusEdge::Closed, new == LockStatus::Closed);
        }
    }
}
