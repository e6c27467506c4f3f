#![no_main]

use libfuzzer_sys::fuzz_target;
use recuperar::workflow::{parse_duration_ms, FaultStep, FaultWorkflow};

fuzz_target!(|data: &[u8]| {
    // Workflow deadlines come from user-written documents; any string must
    // either parse or fail with InvalidDuration, and whatever parses must lay
    // out serially without overflow
    if let Ok(input) = std::str::from_utf8(data) {
        let leaves: Vec<FaultStep> = input
            .split(',')
            .filter_map(|d| parse_duration_ms(d).ok())
            .map(|duration_ms| FaultStep::Leaf {
                name: "leaf".to_string(),
                duration_ms,
            })
            .collect();
        let workflow = FaultWorkflow::Tree {
            name: "fuzz".to_string(),
            root: FaultStep::Serial(leaves),
        };
        let _ = workflow.resolve_onsets(0.0);
    }
});
