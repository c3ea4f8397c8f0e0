//! 記録済みフレーム列をセッションに流し込む

use std::io::BufRead;

use super::angle::MeasurementMode;
use super::session::MeasurementSession;
use super::throttle::FrameThrottle;
use crate::pose::{FrameReader, RecordError, Side};
use crate::render::angle_label;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// 読み込んだ行数 (壊れた行を含む)
    pub frames: u64,
    /// スロットルを通過したフレーム数
    pub processed: u64,
    /// 計測できなかったフレーム数
    pub rejected: u64,
    /// 読み飛ばした不正な行・フレーム数
    pub malformed: u64,
}

/// `reader` の全フレームを処理する
///
/// 壊れた行・ランドマーク不足のフレームは警告して読み飛ばす。
/// 入力の読み込み自体に失敗した場合だけ中断する。
pub fn replay<R: BufRead>(
    reader: FrameReader<R>,
    session: &mut MeasurementSession,
    throttle: &mut FrameThrottle,
    side: Side,
    mode: MeasurementMode,
) -> Result<ReplayStats, RecordError> {
    let mut stats = ReplayStats::default();

    for record in reader {
        stats.frames += 1;
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_recoverable() => {
                stats.malformed += 1;
                log::warn!("{:#}", anyhow::Error::from(e));
                continue;
            }
            Err(e) => return Err(e),
        };

        let (timestamp_ms, frame) = record.into_frame();
        if !throttle.ready(timestamp_ms) {
            continue;
        }
        stats.processed += 1;

        match session.process_frame(&frame, side, mode, timestamp_ms) {
            Ok(snapshot) => {
                if !snapshot.quality_ok {
                    stats.rejected += 1;
                }
                log::debug!(
                    "{} ms: {} (peak {})",
                    timestamp_ms,
                    angle_label(snapshot.current_angle),
                    angle_label(snapshot.peak_angle)
                );
            }
            Err(e) => {
                stats.malformed += 1;
                log::warn!("frame at {} ms skipped: {}", timestamp_ms, e);
            }
        }
    }

    Ok(stats)
}
