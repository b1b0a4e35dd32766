//! Completion callbacks (§4.6): what a `TransformExecutor` invokes once its
//! evaluator has run to completion or failed.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::context::TimerData;

/// The two completion-callback flavors (§4.6). Both are ultimately handled
/// by the same code path in `TransformExecutor::run`; this only changes
/// which `firedTimers` list is handed to `EvaluationContext::handle_result`.
#[derive(Debug, Clone)]
pub enum Callback {
    /// `context.handle_result(input, [], result)` — the common case.
    Default,
    /// `context.handle_result(input, timers, result)` — used for the
    /// synthetic bundle a fired timer group is delivered as (§4.5b).
    Timer(Arc<Vec<TimerData>>),
}

impl Callback {
    /// The fired-timer list to pass to `handle_result`: empty for the
    /// default flavor, the originating timer group otherwise.
    pub fn fired_timers(&self) -> Arc<Vec<TimerData>> {
        match self {
            Callback::Default => Arc::new(Vec::new()),
            Callback::Timer(timers) => Arc::clone(timers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::Key;
    use crate::context::TimeDomain;
    use chrono::Utc;

    #[test]
    fn test_default_callback_has_no_fired_timers() {
        assert!(Callback::Default.fired_timers().is_empty());
    }

    #[test]
    fn test_timer_callback_carries_its_timers() {
        let timers = Arc::new(vec![TimerData {
            key: Key::from_slice(b"k1"),
            domain: TimeDomain::EventTime,
            fire_time: Utc::now(),
            tag: "t1".to_string(),
        }]);
        let callback = Callback::Timer(Arc::clone(&timers));
        assert_eq!(callback.fired_timers().len(), 1);
    }
}
