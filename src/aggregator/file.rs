//! File-level aggregation

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{StatsError, StatsResult};
use crate::utils::TimeNormalizer;

use super::{AggregationOutcome, MatchAggregator};

static IP_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9,.]*").expect("valid ip prefix regex"));

/// Aggregation result for one log file
#[derive(Debug, Clone, Serialize)]
pub struct FileAggregation {
    pub path: PathBuf,
    pub ip: String,
    #[serde(flatten)]
    pub outcome: AggregationOutcome,
}

/// Server identity encoded as the leading `[0-9,.]` run of the file name
pub fn extract_ip(path: &Path) -> StatsResult<String> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let ip = IP_PREFIX_RE
        .find(&file_name)
        .map(|m| m.as_str())
        .unwrap_or_default();

    if ip.is_empty() {
        return Err(StatsError::MissingIdentity(path.display().to_string()));
    }
    Ok(ip.to_string())
}

/// Read and aggregate a whole log file
pub fn aggregate_file(path: &Path, normalizer: TimeNormalizer) -> StatsResult<FileAggregation> {
    let ip = extract_ip(path)?;

    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut aggregator = MatchAggregator::new(ip.clone(), normalizer);

    // Server logs are not guaranteed to be valid UTF-8 (player names)
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        aggregator.feed_line(&String::from_utf8_lossy(&buf));
    }

    Ok(FileAggregation {
        path: path.to_path_buf(),
        ip,
        outcome: aggregator.finish(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_extract_ip() {
        assert_eq!(
            extract_ip(Path::new("/logs/192.168.1.20_l1019000.log")).unwrap(),
            "192.168.1.20"
        );
        assert_eq!(
            extract_ip(Path::new("10.0.0.1,27015-match.log")).unwrap(),
            "10.0.0.1,27015"
        );
    }

    #[test]
    fn test_extract_ip_missing() {
        let err = extract_ip(Path::new("/logs/server.log")).unwrap_err();
        assert!(matches!(err, StatsError::MissingIdentity(_)));
        assert!(err.is_file_scoped());
    }

    #[test]
    fn test_aggregate_file_with_invalid_utf8() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("10.1.1.1_a.log");
        let mut file = File::create(&path).unwrap();
        writeln!(file, r#"L 10/19/2026 - 14:00:00: Loading map "Town""#).unwrap();
        file.write_all(b"L 10/19/2026 - 14:00:05: \"Bad\xffName<2><STEAM_1:0:1><#Team_Security>\" killed \"R<5><BOT><#Team_Insurgent>\" with \"weapon_m9\"\n").unwrap();
        writeln!(file, r##"L 10/19/2026 - 14:05:00: Team "#Team_Insurgent" triggered "Round_Win""##).unwrap();
        drop(file);

        let result = aggregate_file(&path, TimeNormalizer::default()).unwrap();
        assert_eq!(result.ip, "10.1.1.1");
        assert_eq!(result.outcome.matches.len(), 1);

        let m = &result.outcome.matches[0];
        assert_eq!(m.record.ip, "10.1.1.1");
        assert_eq!(m.record.duration_seconds, 300);
        assert_eq!(m.players["STEAM_1:0:1"].kills, 1);
    }
}
