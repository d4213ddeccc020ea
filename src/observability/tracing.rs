//! Span helpers.
//!
//! Every start and stop of a controller runs inside a `lifecycle` span that
//! carries the program name, the script name (if any) and a per-controller
//! run id, so interleaved logs from signal watchers stay attributable.

use uuid::Uuid;

use crate::config::ProgramInfo;

pub fn run_span(info: &ProgramInfo, script: Option<&ProgramInfo>, run_id: Uuid) -> ::tracing::Span {
    ::tracing::info_span!(
        "lifecycle",
        program = %info.name,
        script = script.map(|s| s.name.as_str()).unwrap_or(""),
        run_id = %run_id,
    )
}
