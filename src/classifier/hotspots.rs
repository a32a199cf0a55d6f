//! Hotspot derivation for high and critical functions

use crate::models::{CallFrequency, Hotspot, HotspotReason, ScoreRecord};

const CLI_OUTPUT_SUGGESTION: &str =
    "CLI output code; confirm the cli-output call frequency is declared";

/// Pick one cause, first match wins: bounded loop, loop-dominant, cascading, direct.
pub fn reason_for(record: &ScoreRecord) -> HotspotReason {
    if record.has_bounded_loops {
        HotspotReason::BoundedLoop
    } else if record.loop_pressure > record.call_pressure {
        HotspotReason::LoopDominant
    } else if record.propagated_score > record.direct_score {
        HotspotReason::Cascading
    } else {
        HotspotReason::DirectDominant
    }
}

fn suggestion_for(reason: HotspotReason, frequency: Option<&CallFrequency>) -> &'static str {
    match (reason, frequency) {
        (HotspotReason::LoopDominant, Some(CallFrequency::CliOutput)) => CLI_OUTPUT_SUGGESTION,
        _ => reason.suggestion(),
    }
}

/// Hotspots in the order of `records`; excluded records never qualify.
pub fn derive_hotspots(records: &[ScoreRecord]) -> Vec<Hotspot> {
    records
        .iter()
        .filter(|r| !r.is_excluded && r.severity.is_hotspot())
        .map(|r| {
            let kind = reason_for(r);
            let reason = match &r.call_frequency {
                Some(freq) => format!("[{}] {}", freq, kind.description()),
                None => kind.description().to_string(),
            };
            Hotspot {
                node_id: r.node_id,
                name: r.name.clone(),
                file_path: r.file_path.clone(),
                line: r.line,
                score: r.total_score,
                severity: r.severity,
                kind,
                reason,
                suggestion: suggestion_for(kind, r.call_frequency.as_ref()).to_string(),
            }
        })
        .collect()
}
