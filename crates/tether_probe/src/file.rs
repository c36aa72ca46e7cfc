//! Probe request files and probe output files.
//!
//! Both share one line format: `<probe name> <target net>`, separated by
//! whitespace, with `#` comment lines. The target `null` means "no net".

use std::path::Path;

use tether_common::natural_cmp;

use crate::error::ProbeFileError;
use crate::map::ProbeMap;

/// Target token meaning "no net".
pub const NULL_TARGET: &str = "null";

/// One line of a probe request file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    /// Probe name as written; may not name a probe of the bus.
    pub probe: String,
    /// Requested target net, `None` for `null`.
    pub target: Option<String>,
}

/// Parses probe requests, skipping blank and `#` lines.
pub fn parse_probe_requests(text: &str) -> Result<Vec<ProbeRequest>, ProbeFileError> {
    let mut requests = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        let [probe, target] = tokens.as_slice() else {
            return Err(ProbeFileError::Malformed {
                line: index + 1,
                content: line.to_string(),
            });
        };
        requests.push(ProbeRequest {
            probe: probe.to_string(),
            target: (*target != NULL_TARGET).then(|| target.to_string()),
        });
    }
    Ok(requests)
}

/// Reads and parses a probe request file.
pub fn read_probe_requests(path: &Path) -> Result<Vec<ProbeRequest>, ProbeFileError> {
    let text = std::fs::read_to_string(path).map_err(|e| ProbeFileError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_probe_requests(&text)
}

/// Renders a probe map in probe file format, sorted by natural probe order.
pub fn render_probe_file(map: &ProbeMap, probe_count: u32) -> String {
    let mut lines: Vec<(String, &str)> = map
        .iter()
        .map(|(probe, target)| (probe, target.unwrap_or(NULL_TARGET)))
        .collect();
    lines.sort_by(|a, b| natural_cmp(&a.0, &b.0));

    let mut out = String::new();
    out.push_str("# Probe mapping: <full probe net path> -> <full debug net path>\n");
    out.push_str(&format!("# probe_count of design that wrote this = {probe_count}\n"));
    for (probe, target) in lines {
        out.push_str(&probe);
        out.push(' ');
        out.push_str(target);
        out.push('\n');
    }
    out
}

/// Writes a probe map to `path`, replacing any existing file.
pub fn write_probe_file(path: &Path, map: &ProbeMap, probe_count: u32) -> Result<(), ProbeFileError> {
    std::fs::write(path, render_probe_file(map, probe_count)).map_err(|e| ProbeFileError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), probes = map.len(), "wrote probe file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::ProbeBus;

    fn bus() -> ProbeBus {
        ProbeBus::new("top/u_ila_0", "probe0")
    }

    #[test]
    fn parse_skips_comments_and_blanks() {
        let text = "# header\n\n  top/u_ila_0/probe0[0]   top/data_q\n# more\ntop/u_ila_0/probe0[1] null\n";
        let requests = parse_probe_requests(text).unwrap();
        assert_eq!(
            requests,
            vec![
                ProbeRequest {
                    probe: "top/u_ila_0/probe0[0]".into(),
                    target: Some("top/data_q".into()),
                },
                ProbeRequest {
                    probe: "top/u_ila_0/probe0[1]".into(),
                    target: None,
                },
            ]
        );
    }

    #[test]
    fn parse_rejects_wrong_token_count() {
        let err = parse_probe_requests("a b\nonly_one\n").unwrap_err();
        assert!(matches!(err, ProbeFileError::Malformed { line: 2, .. }));
        assert!(parse_probe_requests("a b c").is_err());
    }

    #[test]
    fn render_sorts_naturally() {
        let mut map = ProbeMap::new(bus());
        for i in [10, 2, 9, 1] {
            map.insert(i, Some(format!("top/sig{i}")));
        }
        let text = render_probe_file(&map, 11);
        let body: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(
            body,
            vec![
                "top/u_ila_0/probe0[1] top/sig1",
                "top/u_ila_0/probe0[2] top/sig2",
                "top/u_ila_0/probe0[9] top/sig9",
                "top/u_ila_0/probe0[10] top/sig10",
            ]
        );
        assert!(text.contains("# probe_count of design that wrote this = 11\n"));
    }

    #[test]
    fn written_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("design_probes.txt");
        let mut map = ProbeMap::new(bus());
        map.insert(0, Some("top/a".into()));
        map.insert(1, None);
        write_probe_file(&path, &map, 2).unwrap();

        let requests = read_probe_requests(&path).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].target.as_deref(), Some("top/a"));
        assert_eq!(requests[1].probe, "top/u_ila_0/probe0[1]");
        assert_eq!(requests[1].target, None);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_probe_requests(&dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, ProbeFileError::Io { .. }));
    }
}
