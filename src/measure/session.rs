use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::angle::{AngleCalculator, MeasurementMode};
use super::smooth::EmaSmoother;
use crate::config::Config;
use crate::pose::{FrameError, LandmarkFrame, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    /// 検出器アダプタの契約違反。フレームは捨て、セッションはそのまま。
    #[error("malformed landmark frame: {len} entries (need at least 25)")]
    MalformedFrame { len: usize },
}

/// 計測サンプル (平滑化後の角度)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleReading {
    pub timestamp_ms: u64,
    pub mode: MeasurementMode,
    pub side: Side,
    pub degrees: f64,
}

/// 1フレーム処理後の表示用の状態
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionSnapshot {
    pub current_angle: Option<f64>,
    pub peak_angle: Option<f64>,
    /// 視点判定を通過し角度が得られたか
    pub quality_ok: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// サンプルなし
    Empty,
    /// 1つ以上の有効サンプルあり
    Accumulating,
}

/// 1人・1側・1モードの計測セッション
///
/// フレームごとに角度計算 → EMA → ピーク更新 → サンプル追加 を行う。
/// 単一スレッドから順番に呼ぶこと (複数スレッドから使う場合は呼び出し側で直列化する)。
#[derive(Debug, Clone)]
pub struct MeasurementSession {
    side: Side,
    mode: MeasurementMode,
    calculator: AngleCalculator,
    smoother: EmaSmoother,
    current_angle: Option<f64>,
    peak_angle: Option<f64>,
    samples: Vec<AngleReading>,
}

impl MeasurementSession {
    /// `alpha` は 0 < alpha <= 1
    pub fn new(side: Side, mode: MeasurementMode, alpha: f64) -> Self {
        Self::with_parts(side, mode, AngleCalculator::default(), EmaSmoother::new(alpha))
    }

    pub fn from_config(config: &Config, side: Side, mode: MeasurementMode) -> Self {
        Self::with_parts(
            side,
            mode,
            AngleCalculator::from_config(config),
            EmaSmoother::from_config(&config.smooth),
        )
    }

    fn with_parts(
        side: Side,
        mode: MeasurementMode,
        calculator: AngleCalculator,
        smoother: EmaSmoother,
    ) -> Self {
        Self {
            side,
            mode,
            calculator,
            smoother,
            current_angle: None,
            peak_angle: None,
            samples: Vec::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn mode(&self) -> MeasurementMode {
        self.mode
    }

    pub fn alpha(&self) -> f64 {
        self.smoother.alpha()
    }

    pub fn current_angle(&self) -> Option<f64> {
        self.current_angle
    }

    pub fn peak_angle(&self) -> Option<f64> {
        self.peak_angle
    }

    /// 到着順のサンプル列
    pub fn samples(&self) -> &[AngleReading] {
        &self.samples
    }

    pub fn phase(&self) -> SessionPhase {
        if self.samples.is_empty() {
            SessionPhase::Empty
        } else {
            SessionPhase::Accumulating
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_angle: self.current_angle,
            peak_angle: self.peak_angle,
            quality_ok: self.current_angle.is_some(),
        }
    }

    /// 計測側を切り替える。値が変わったときだけリセットし true を返す。
    pub fn select_side(&mut self, side: Side) -> bool {
        if side == self.side {
            return false;
        }
        self.side = side;
        self.reset();
        true
    }

    /// 計測モードを切り替える。値が変わったときだけリセットし true を返す。
    pub fn select_mode(&mut self, mode: MeasurementMode) -> bool {
        if mode == self.mode {
            return false;
        }
        self.mode = mode;
        self.reset();
        true
    }

    /// 平滑化の重みを変更する。セッション途中の変更は常にリセットを伴う。
    pub fn set_alpha(&mut self, alpha: f64) {
        self.smoother = EmaSmoother::new(alpha);
        self.reset();
    }

    /// 1フレームを処理する
    ///
    /// 計測できないフレーム (人物なし・視点不適・退化) は `quality_ok = false` で返し、
    /// ピークとサンプルは変更しない。ランドマーク数が足りないフレームのみエラー。
    pub fn process_frame(
        &mut self,
        frame: &LandmarkFrame,
        side: Side,
        mode: MeasurementMode,
        timestamp_ms: u64,
    ) -> Result<SessionSnapshot, SessionError> {
        if let Err(FrameError::TooShort { len }) = frame.check() {
            return Err(SessionError::MalformedFrame { len });
        }

        self.select_side(side);
        self.select_mode(mode);

        let raw = match self.calculator.measure(frame, self.side, self.mode) {
            Ok(angle) => angle,
            Err(FrameError::NoBody) => None,
            Err(FrameError::TooShort { len }) => return Err(SessionError::MalformedFrame { len }),
        };

        let Some(raw) = raw else {
            self.current_angle = None;
            return Ok(SessionSnapshot {
                current_angle: None,
                peak_angle: self.peak_angle,
                quality_ok: false,
            });
        };

        let angle = self.calculator.clamp(self.mode, self.smoother.apply(raw));
        self.current_angle = Some(angle);
        self.peak_angle = Some(match self.peak_angle {
            Some(peak) => peak.max(angle),
            None => angle,
        });
        self.samples.push(AngleReading {
            timestamp_ms,
            mode: self.mode,
            side: self.side,
            degrees: angle,
        });

        Ok(SessionSnapshot {
            current_angle: self.current_angle,
            peak_angle: self.peak_angle,
            quality_ok: true,
        })
    }

    /// 現在値・ピーク・サンプル・平滑化状態をすべて消去する
    pub fn reset(&mut self) {
        log::debug!(
            "session reset ({} {}, {} samples dropped)",
            self.mode.name(),
            self.side.name(),
            self.samples.len()
        );
        self.current_angle = None;
        self.peak_angle = None;
        self.samples.clear();
        self.smoother.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Landmark;

    const ABD: MeasurementMode = MeasurementMode::Abduction;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    /// 正面向きで肘を (x, y) に置いたフレーム。肩 (0.5, 0.5)、腰中点は肩の真下。
    fn frontal_with_elbow(x: f32, y: f32) -> LandmarkFrame {
        let mut frame = LandmarkFrame::new(vec![Landmark::default(); 25]);
        frame.landmarks[11] = Landmark::new(0.5, 0.5, 0.0);
        frame.landmarks[12] = Landmark::new(0.7, 0.5, 0.0);
        frame.landmarks[13] = Landmark::new(x, y, 0.0);
        frame.landmarks[23] = Landmark::new(0.5, 0.75, 0.0);
        frame.landmarks[24] = Landmark::new(0.5, 0.75, 0.0);
        frame
    }

    /// 外転角 deg° の位置に肘を置く
    fn abduction_frame(deg: f64) -> LandmarkFrame {
        let r = deg.to_radians();
        let x = 0.5 - 0.25 * r.sin();
        let y = 0.5 + 0.25 * r.cos();
        frontal_with_elbow(x as f32, y as f32)
    }

    fn side_view_frame() -> LandmarkFrame {
        let mut frame = frontal_with_elbow(0.5, 0.75);
        frame.landmarks[12].z = 0.3;
        frame
    }

    #[test]
    fn test_first_valid_frame_initializes() {
        let mut session = MeasurementSession::new(Side::Left, ABD, 0.2);
        assert_eq!(session.phase(), SessionPhase::Empty);

        let snap = session.process_frame(&abduction_frame(90.0), Side::Left, ABD, 100).unwrap();
        assert!(snap.quality_ok);
        assert!(approx_eq(snap.current_angle.unwrap(), 90.0, 1e-3));
        assert_eq!(snap.peak_angle, snap.current_angle);
        assert_eq!(session.phase(), SessionPhase::Accumulating);
        assert_eq!(session.samples().len(), 1);
    }

    #[test]
    fn test_smoothing_applied() {
        let mut session = MeasurementSession::new(Side::Left, ABD, 0.5);
        session.process_frame(&abduction_frame(40.0), Side::Left, ABD, 0).unwrap();
        let snap = session.process_frame(&abduction_frame(120.0), Side::Left, ABD, 50).unwrap();
        assert!(approx_eq(snap.current_angle.unwrap(), 80.0, 1e-3));
    }

    #[test]
    fn test_unmeasurable_frame_keeps_peak() {
        let mut session = MeasurementSession::new(Side::Left, ABD, 1.0);
        session.process_frame(&abduction_frame(60.0), Side::Left, ABD, 0).unwrap();

        let snap = session.process_frame(&side_view_frame(), Side::Left, ABD, 50).unwrap();
        assert!(!snap.quality_ok);
        assert_eq!(snap.current_angle, None);
        assert!(approx_eq(snap.peak_angle.unwrap(), 60.0, 1e-3));
        assert_eq!(session.samples().len(), 1);
        // 無効フレームで状態は後退しない
        assert_eq!(session.phase(), SessionPhase::Accumulating);

        let snap = session.process_frame(&LandmarkFrame::empty(), Side::Left, ABD, 100).unwrap();
        assert!(!snap.quality_ok);
        assert_eq!(session.samples().len(), 1);
    }

    #[test]
    fn test_unmeasurable_first_frame_stays_empty() {
        let mut session = MeasurementSession::new(Side::Left, ABD, 0.2);
        let snap = session.process_frame(&side_view_frame(), Side::Left, ABD, 0).unwrap();
        assert_eq!(snap, SessionSnapshot::default());
        assert_eq!(session.phase(), SessionPhase::Empty);
    }

    #[test]
    fn test_peak_is_running_maximum() {
        let mut session = MeasurementSession::new(Side::Left, ABD, 0.3);
        let targets = [20.0, 70.0, 150.0, 90.0, 10.0, 160.0, 30.0];
        let mut prev_peak = f64::MIN;
        let mut max_seen = f64::MIN;
        for (i, &deg) in targets.iter().enumerate() {
            let snap = session
                .process_frame(&abduction_frame(deg), Side::Left, ABD, i as u64 * 50)
                .unwrap();
            let peak = snap.peak_angle.unwrap();
            max_seen = max_seen.max(snap.current_angle.unwrap());
            assert!(peak >= prev_peak);
            assert_eq!(peak, max_seen);
            prev_peak = peak;
        }
    }

    #[test]
    fn test_malformed_frame_does_not_touch_state() {
        let mut session = MeasurementSession::new(Side::Left, ABD, 0.2);
        session.process_frame(&abduction_frame(45.0), Side::Left, ABD, 0).unwrap();
        let before = session.clone();

        let short = LandmarkFrame::new(vec![Landmark::default(); 13]);
        let err = session
            .process_frame(&short, Side::Right, MeasurementMode::Flexion, 50)
            .unwrap_err();
        assert_eq!(err, SessionError::MalformedFrame { len: 13 });
        assert_eq!(session.side(), Side::Left);
        assert_eq!(session.mode(), ABD);
        assert_eq!(session.samples(), before.samples());
        assert_eq!(session.peak_angle(), before.peak_angle());
        assert_eq!(session.current_angle(), before.current_angle());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = MeasurementSession::new(Side::Left, ABD, 0.1);
        for i in 0..5 {
            session.process_frame(&abduction_frame(30.0 * i as f64), Side::Left, ABD, i).unwrap();
        }
        session.reset();
        assert_eq!(session.current_angle(), None);
        assert_eq!(session.peak_angle(), None);
        assert!(session.samples().is_empty());
        assert_eq!(session.phase(), SessionPhase::Empty);

        // 平滑化状態も消えているので、次の値はそのまま通る
        let snap = session.process_frame(&abduction_frame(100.0), Side::Left, ABD, 10).unwrap();
        assert!(approx_eq(snap.current_angle.unwrap(), 100.0, 1e-3));
    }

    #[test]
    fn test_reselecting_same_value_does_not_reset() {
        let mut session = MeasurementSession::new(Side::Left, ABD, 0.2);
        session.process_frame(&abduction_frame(50.0), Side::Left, ABD, 0).unwrap();
        assert!(!session.select_side(Side::Left));
        assert!(!session.select_mode(ABD));
        assert_eq!(session.samples().len(), 1);
    }

    #[test]
    fn test_side_or_mode_change_starts_new_session() {
        let mut session = MeasurementSession::new(Side::Left, ABD, 0.2);
        session.process_frame(&abduction_frame(50.0), Side::Left, ABD, 0).unwrap();
        assert!(session.select_mode(MeasurementMode::Flexion));
        assert!(session.samples().is_empty());
        assert_eq!(session.peak_angle(), None);

        session.select_mode(ABD);
        session.process_frame(&abduction_frame(50.0), Side::Left, ABD, 0).unwrap();
        // process_frame に別の側を渡しても新しいセッションになる
        let snap = session.process_frame(&abduction_frame(50.0), Side::Right, ABD, 50).unwrap();
        assert_eq!(session.side(), Side::Right);
        assert_eq!(session.samples().len(), 1);
        assert_eq!(session.samples()[0].side, Side::Right);
        assert_eq!(snap.peak_angle, snap.current_angle);
    }

    #[test]
    fn test_samples_preserve_order_and_values() {
        let mut session = MeasurementSession::new(Side::Left, ABD, 1.0);
        let stamps = [10u64, 10, 40, 90];
        let mut expected = Vec::new();
        for (i, &ts) in stamps.iter().enumerate() {
            let snap = session
                .process_frame(&abduction_frame(20.0 * (i + 1) as f64), Side::Left, ABD, ts)
                .unwrap();
            expected.push(AngleReading {
                timestamp_ms: ts,
                mode: ABD,
                side: Side::Left,
                degrees: snap.current_angle.unwrap(),
            });
        }
        // 同じタイムスタンプも重複排除しない
        assert_eq!(session.samples(), expected.as_slice());
    }

    #[test]
    fn test_non_finite_frame_does_not_poison_smoother() {
        let mut session = MeasurementSession::new(Side::Left, ABD, 0.5);
        let mut broken = abduction_frame(90.0);
        broken.landmarks[13].x = f32::NAN;
        let snap = session.process_frame(&broken, Side::Left, ABD, 0).unwrap();
        assert_eq!(snap, SessionSnapshot::default());
        assert_eq!(session.phase(), SessionPhase::Empty);

        for (i, &deg) in [60.0, 80.0, 100.0].iter().enumerate() {
            let snap = session
                .process_frame(&abduction_frame(deg), Side::Left, ABD, 50 * (i as u64 + 1))
                .unwrap();
            assert!(snap.quality_ok);
            assert!(snap.current_angle.unwrap().is_finite());
            assert!(snap.peak_angle.unwrap().is_finite());
        }
        // 60 → 70 → 85
        assert!(approx_eq(session.current_angle().unwrap(), 85.0, 1e-3));
        assert!(session.samples().iter().all(|s| s.degrees.is_finite()));
    }

    #[test]
    fn test_from_config_uses_smooth_alpha() {
        let config = Config::from_toml("[smooth]\nalpha = 0.5\n").unwrap();
        let session = MeasurementSession::from_config(&config, Side::Right, ABD);
        assert_eq!(session.alpha(), 0.5);
        assert_eq!(session.side(), Side::Right);
    }

    #[test]
    fn test_set_alpha_resets() {
        let mut session = MeasurementSession::new(Side::Left, ABD, 0.2);
        session.process_frame(&abduction_frame(50.0), Side::Left, ABD, 0).unwrap();
        session.set_alpha(0.5);
        assert_eq!(session.alpha(), 0.5);
        assert!(session.samples().is_empty());
    }

    #[test]
    fn test_extension_clamped_after_smoothing() {
        let mut session = MeasurementSession::new(Side::Left, MeasurementMode::Extension, 0.2);
        let mut frame = side_view_frame();
        // 後方へ水平に近い: 生の値は 50° に丸められる
        frame.landmarks[13] = Landmark::new(0.5, 0.5, -0.3);
        let snap = session
            .process_frame(&frame, Side::Left, MeasurementMode::Extension, 0)
            .unwrap();
        assert_eq!(snap.current_angle, Some(50.0));
        assert!(session.samples().iter().all(|s| s.degrees <= 50.0));
    }
}
