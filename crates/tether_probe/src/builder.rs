//! Building probe maps from request files and debug-flagged nets.

use std::collections::VecDeque;

use tether_diagnostics::{Diagnostic, DiagnosticSink};

use crate::bus::{ProbeBus, MAX_PROBE_COUNT};
use crate::codes;
use crate::error::ProbeMapError;
use crate::file::ProbeRequest;
use crate::map::ProbeMap;

/// Builds a probe map from parsed request lines.
///
/// Requests naming a probe of `bus` claim that index; a later line for the
/// same probe replaces an earlier one. Requests whose probe name is not on
/// the bus are *floating*: they take the lowest free indices, in file order.
/// Indices below the highest claimed one that stay free get `default`.
/// `origin` names the request source in errors.
pub fn from_requests(
    bus: &ProbeBus,
    requests: &[ProbeRequest],
    default: Option<&str>,
    origin: &str,
    sink: &DiagnosticSink,
) -> Result<ProbeMap, ProbeMapError> {
    let mut map = ProbeMap::new(bus.clone());
    let mut floating: VecDeque<&ProbeRequest> = VecDeque::new();

    for request in requests {
        match bus.parse_index(&request.probe) {
            Some(index) if index >= MAX_PROBE_COUNT => {
                return Err(ProbeMapError::IndexOutOfRange {
                    probe: request.probe.clone(),
                    max: MAX_PROBE_COUNT,
                });
            }
            Some(index) => map.insert(index, request.target.clone()),
            None => floating.push_back(request),
        }
    }

    let claimed_up_to = map.highest_index().unwrap_or(0);
    let mut index = 0;
    while index < claimed_up_to || (!floating.is_empty() && index < MAX_PROBE_COUNT) {
        if !map.contains(index) {
            match floating.pop_front() {
                Some(request) => {
                    sink.emit(
                        Diagnostic::note(
                            codes::FLOATING_ASSIGNED,
                            format!("request `{}` does not name a probe, assigned to index {index}", request.probe),
                        )
                        .with_subject(bus.probe_name(index)),
                    );
                    map.insert(index, request.target.clone());
                }
                None => map.insert(index, default.map(str::to_string)),
            }
        }
        index += 1;
    }

    if !floating.is_empty() {
        sink.emit(
            Diagnostic::warning(
                codes::FLOATING_DROPPED,
                format!("{} requests did not fit on the probe bus and were dropped", floating.len()),
            )
            .with_subject(origin),
        );
    }

    if map.is_empty() {
        return Err(ProbeMapError::Empty {
            source_name: origin.to_string(),
        });
    }
    tracing::debug!(probes = map.len(), origin, "probe map from request file");
    Ok(map)
}

/// Builds a probe map assigning `nets` to consecutive probes in list order.
///
/// The list is truncated to the hard probe limit with a warning.
pub fn from_debug_nets(
    bus: &ProbeBus,
    nets: &[String],
    origin: &str,
    sink: &DiagnosticSink,
) -> Result<ProbeMap, ProbeMapError> {
    if nets.len() > MAX_PROBE_COUNT as usize {
        sink.emit(
            Diagnostic::warning(
                codes::DEBUG_LIST_TRUNCATED,
                format!(
                    "more than {MAX_PROBE_COUNT} nets marked for debug, truncating list of {} debug nets",
                    nets.len()
                ),
            )
            .with_subject(origin),
        );
    }

    let mut map = ProbeMap::new(bus.clone());
    for (index, net) in (0..MAX_PROBE_COUNT).zip(nets) {
        map.insert(index, Some(net.clone()));
    }
    if map.is_empty() {
        return Err(ProbeMapError::Empty {
            source_name: origin.to_string(),
        });
    }
    tracing::debug!(probes = map.len(), origin, "probe map from debug nets");
    Ok(map)
}

/// Applies a requested probe count to `map` and returns the effective count.
///
/// Without a request the count is the map size. A request below the map
/// size is ignored with a note; one above the hard limit is an error.
/// Otherwise the map is padded with `default` up to the request.
pub fn apply_requested_count(
    map: &mut ProbeMap,
    requested: Option<u32>,
    default: Option<&str>,
    sink: &DiagnosticSink,
) -> Result<u32, ProbeMapError> {
    let size = map.len() as u32;
    let Some(requested) = requested else {
        return Ok(size);
    };
    if requested < size {
        sink.emit(
            Diagnostic::note(
                codes::COUNT_IGNORED,
                format!("ignoring probe count {requested}, it is smaller than the {size} mapped probes"),
            )
            .with_help("omit the probe count or pass a larger one"),
        );
        return Ok(size);
    }
    if requested > MAX_PROBE_COUNT {
        return Err(ProbeMapError::CountOverLimit {
            requested,
            max: MAX_PROBE_COUNT,
        });
    }
    map.pad_to(requested, default);
    Ok(requested)
}
