//! Up/down classification and the alert trigger policy.
//!
//! Everything here is pure: no I/O, no clock reads.

use crate::models::{Check, CheckState, Outcome};

/// State the engine decided on after one probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub state: CheckState,
    pub alert: bool,
    /// Epoch milliseconds stamped on the check and its log record
    pub checked_at: i64,
}

/// `Up` iff the probe got a response whose code the owner listed as healthy
pub fn evaluate(check: &Check, outcome: &Outcome) -> CheckState {
    match (&outcome.error, outcome.response_code) {
        (None, Some(code)) if check.success_codes.contains(&code) => CheckState::Up,
        _ => CheckState::Down,
    }
}

/// A first probe never alerts; afterwards only a change of state does
pub fn should_alert(check: &Check, new_state: CheckState) -> bool {
    check.has_history() && new_state != check.state
}

/// Evaluate `outcome` and write the result onto `check`.
///
/// This is the only place `state` and `last_checked` change, and the caller
/// must persist `check` right after.
pub fn apply(check: &mut Check, outcome: &Outcome, now_ms: i64) -> Evaluation {
    let state = evaluate(check, outcome);
    let alert = should_alert(check, state);

    check.state = state;
    check.last_checked = Some(now_ms);

    Evaluation { state, alert, checked_at: now_ms }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HttpMethod, Protocol};

    fn check(codes: Vec<u16>) -> Check {
        Check::new("5551234567", Protocol::Https, "example.com", HttpMethod::Get, codes, 2)
    }

    fn probed(state: CheckState) -> Check {
        let mut check = check(vec![200]);
        check.state = state;
        check.last_checked = Some(1_000);
        check
    }

    #[test]
    fn test_listed_code_is_up() {
        assert_eq!(evaluate(&check(vec![200, 204]), &Outcome::response(204)), CheckState::Up);
    }

    #[test]
    fn test_unlisted_code_is_down() {
        assert_eq!(evaluate(&check(vec![200]), &Outcome::response(500)), CheckState::Down);
        assert_eq!(evaluate(&check(vec![200]), &Outcome::response(201)), CheckState::Down);
    }

    #[test]
    fn test_errors_are_down() {
        let check = check(vec![200]);
        assert_eq!(evaluate(&check, &Outcome::timeout("deadline")), CheckState::Down);
        assert_eq!(evaluate(&check, &Outcome::transport("refused")), CheckState::Down);

        // An error wins even if a code somehow came along with it.
        let mut mixed = Outcome::transport("reset");
        mixed.response_code = Some(200);
        assert_eq!(evaluate(&check, &mixed), CheckState::Down);
    }

    #[test]
    fn test_first_probe_never_alerts() {
        let fresh = check(vec![200]);
        assert!(!should_alert(&fresh, CheckState::Down));
        assert!(!should_alert(&fresh, CheckState::Up));
    }

    #[test]
    fn test_only_changes_alert() {
        assert!(should_alert(&probed(CheckState::Up), CheckState::Down));
        assert!(should_alert(&probed(CheckState::Down), CheckState::Up));
        assert!(!should_alert(&probed(CheckState::Up), CheckState::Up));
        assert!(!should_alert(&probed(CheckState::Down), CheckState::Down));
    }

    #[test]
    fn test_apply_alerts_once_per_transition() {
        let mut check = probed(CheckState::Up);

        let first = apply(&mut check, &Outcome::response(500), 2_000);
        assert_eq!(first, Evaluation { state: CheckState::Down, alert: true, checked_at: 2_000 });
        assert_eq!(check.state, CheckState::Down);
        assert_eq!(check.last_checked, Some(2_000));

        let second = apply(&mut check, &Outcome::response(500), 3_000);
        assert!(!second.alert);
    }

    #[test]
    fn test_apply_on_fresh_check_sets_history() {
        let mut check = check(vec![200]);
        let evaluation = apply(&mut check, &Outcome::timeout("deadline"), 5);

        assert_eq!(evaluation.state, CheckState::Down);
        assert!(!evaluation.alert);
        assert!(check.has_history());
    }
}
