//! Fuzz target for the drift predicate over parsed traces.
//!
//! Every accepted trace either classifies or fails cleanly, and the store
//! total never decreases.

#![no_main]

use dfdrift_core::{ApplyMode, DistributionKind, EventClassifier, SharedDistribution, TraceReader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let classifier = EventClassifier::default();
    for kind in [DistributionKind::DirectlyFollows, DistributionKind::Activity] {
        let store = SharedDistribution::new(kind);
        for trace in TraceReader::new(data).map_while(Result::ok) {
            let before = store.total().unwrap_or_default();
            if let Ok(check) =
                store.check_drift_trace(&trace.events, &classifier, ApplyMode::Atomic, 0.01)
            {
                assert!(check.norm.is_finite());
                assert!(check.total_after >= before);
            }
        }
    }
});
