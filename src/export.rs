use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::measure::{AngleReading, MeasurementMode, MeasurementSession};
use crate::pose::Side;

pub const CSV_HEADER: &str = "timestamp,mode,side,angle";

// --- データ構造 ---

/// セッションの保存用まとめ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub mode: MeasurementMode,
    pub side: Side,
    pub peak_angle: Option<f64>,
    pub sample_count: usize,
    pub samples: Vec<AngleReading>,
}

impl SessionSummary {
    pub fn from_session(session: &MeasurementSession) -> Self {
        Self {
            mode: session.mode(),
            side: session.side(),
            peak_angle: session.peak_angle(),
            sample_count: session.samples().len(),
            samples: session.samples().to_vec(),
        }
    }
}

// --- CSV ---

/// `timestamp,mode,side,angle` 形式でサンプルを書き出す。角度は小数3桁。
pub fn write_csv<W: Write>(mut writer: W, samples: &[AngleReading]) -> Result<()> {
    writeln!(writer, "{}", CSV_HEADER)?;
    for s in samples {
        writeln!(
            writer,
            "{},{},{},{:.3}",
            s.timestamp_ms,
            s.mode.name(),
            s.side.name(),
            s.degrees
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// 出力ファイル名 (拡張子なし): `rom_ABD_L_1700000000000`
pub fn file_stem(mode: MeasurementMode, side: Side, timestamp_ms: u64) -> String {
    format!("rom_{}_{}_{}", mode.short_label(), side.short_label(), timestamp_ms)
}

/// セッションのサンプルを `dir` に CSV で保存し、パスを返す
pub fn save_csv<P: AsRef<Path>>(
    dir: P,
    session: &MeasurementSession,
    timestamp_ms: u64,
) -> Result<PathBuf> {
    if session.samples().is_empty() {
        bail!("no samples to export");
    }
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;
    let path = dir.join(format!(
        "{}.csv",
        file_stem(session.mode(), session.side(), timestamp_ms)
    ));
    let file = fs::File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(std::io::BufWriter::new(file), session.samples())?;
    Ok(path)
}

// --- JSON ---

pub fn save_summary<P: AsRef<Path>>(path: P, summary: &SessionSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json).context("Failed to write session summary")?;
    Ok(())
}

pub fn load_summary<P: AsRef<Path>>(path: P) -> Result<SessionSummary> {
    let content = fs::read_to_string(path).context("Failed to read session summary")?;
    let summary: SessionSummary = serde_json::from_str(&content)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(ts: u64, degrees: f64) -> AngleReading {
        AngleReading {
            timestamp_ms: ts,
            mode: MeasurementMode::Flexion,
            side: Side::Right,
            degrees,
        }
    }

    #[test]
    fn test_csv_layout() {
        let mut out = Vec::new();
        write_csv(&mut out, &[reading(1000, 12.34567), reading(1050, 90.0)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "timestamp,mode,side,angle\n1000,FLEXION,RIGHT,12.346\n1050,FLEXION,RIGHT,90.000\n"
        );
    }

    #[test]
    fn test_csv_header_only_for_no_samples() {
        let mut out = Vec::new();
        write_csv(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "timestamp,mode,side,angle\n");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(
            file_stem(MeasurementMode::Abduction, Side::Left, 1700000000000),
            "rom_ABD_L_1700000000000"
        );
        assert_eq!(file_stem(MeasurementMode::Extension, Side::Right, 5), "rom_EXT_R_5");
    }

    #[test]
    fn test_save_csv_requires_samples() {
        let dir = tempfile::tempdir().unwrap();
        let session = MeasurementSession::new(Side::Left, MeasurementMode::Abduction, 0.2);
        let err = save_csv(dir.path(), &session, 0).unwrap_err();
        assert!(err.to_string().contains("no samples"));
    }

    #[test]
    fn test_summary_serialization() {
        let summary = SessionSummary {
            mode: MeasurementMode::Flexion,
            side: Side::Right,
            peak_angle: Some(90.0),
            sample_count: 1,
            samples: vec![reading(7, 90.0)],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["mode"], "FLEXION");
        assert_eq!(json["side"], "RIGHT");
        assert_eq!(json["samples"][0]["timestamp_ms"], 7);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        save_summary(&path, &summary).unwrap();
        assert_eq!(load_summary(&path).unwrap(), summary);
    }
}
