//! オーバーレイ描画用のデータ
//!
//! 描画そのものは行わない。ライブプレビュー・動画書き出しの双方が
//! この `OverlayModel` を受け取り、各自のキャンバスに描く。座標はすべて正規化座標。

use super::skeleton::{BASE_AXIS_COLOR, MOVING_AXIS_COLOR, SKELETON_COLOR, SKELETON_CONNECTIONS};
use crate::measure::{MeasurementMode, SessionSnapshot};
use crate::pose::{LandmarkFrame, LandmarkIndex, Side};

/// 基本軸の長さ (画像高さに対する比)
const BASE_AXIS_LENGTH: f32 = 0.15;

/// 線分 (正規化座標)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: [f32; 2],
    pub to: [f32; 2],
}

impl Segment {
    pub fn new(from: [f32; 2], to: [f32; 2]) -> Self {
        Self { from, to }
    }
}

/// 色付きの計測軸
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    pub segment: Segment,
    pub color: u32,
}

/// 画面下部の可動域バー
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RomBar {
    pub max_degrees: f64,
    /// 目安範囲 (度)
    pub window: (f64, f64),
    /// 現在値の位置 (0.0〜1.0)
    pub current: Option<f64>,
    /// ピークの位置 (0.0〜1.0)
    pub peak: Option<f64>,
}

impl RomBar {
    pub fn for_mode(mode: MeasurementMode) -> Self {
        let (max_degrees, window) = match mode {
            MeasurementMode::Extension => (50.0, (40.0, 50.0)),
            _ => (180.0, (150.0, 180.0)),
        };
        Self {
            max_degrees,
            window,
            current: None,
            peak: None,
        }
    }

    /// 角度をバー上の位置に変換する
    pub fn position(&self, degrees: f64) -> f64 {
        (degrees / self.max_degrees).clamp(0.0, 1.0)
    }

    pub fn with_markers(mut self, current: Option<f64>, peak: Option<f64>) -> Self {
        self.current = current.map(|d| self.position(d));
        self.peak = peak.map(|d| self.position(d));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayModel {
    /// "123.4°" / "--.-°"
    pub angle_label: String,
    /// "ABD L" など
    pub status_label: String,
    pub quality_ok: bool,
    pub joints: Vec<[f32; 2]>,
    pub bones: Vec<Segment>,
    pub skeleton_color: u32,
    pub moving_axis: Option<Axis>,
    pub base_axis: Option<Axis>,
    pub rom_bar: RomBar,
}

impl OverlayModel {
    pub fn build(
        frame: &LandmarkFrame,
        snapshot: &SessionSnapshot,
        mode: MeasurementMode,
        side: Side,
    ) -> Self {
        let point = |i: LandmarkIndex| frame.get(i).map(|p| [p.x, p.y]);

        let joints = LandmarkIndex::ALL.iter().filter_map(|&i| point(i)).collect();
        let bones = SKELETON_CONNECTIONS
            .iter()
            .filter_map(|&(a, b)| Some(Segment::new(point(a)?, point(b)?)))
            .collect();

        let (moving_axis, base_axis) = match frame.joints(side) {
            Ok(j) => {
                let shoulder = [j.shoulder.x, j.shoulder.y];
                let elbow = [j.elbow.x, j.elbow.y];
                let base = match mode {
                    MeasurementMode::Abduction => Segment::new(
                        [shoulder[0], shoulder[1] - BASE_AXIS_LENGTH],
                        [shoulder[0], shoulder[1] + BASE_AXIS_LENGTH],
                    ),
                    MeasurementMode::Flexion => {
                        let hip_mid = j.hip_midpoint();
                        Segment::new(shoulder, [hip_mid.x, hip_mid.y])
                    }
                    MeasurementMode::Extension => {
                        Segment::new(shoulder, [shoulder[0], shoulder[1] + BASE_AXIS_LENGTH])
                    }
                };
                (
                    Some(Axis {
                        segment: Segment::new(shoulder, elbow),
                        color: MOVING_AXIS_COLOR,
                    }),
                    Some(Axis {
                        segment: base,
                        color: BASE_AXIS_COLOR,
                    }),
                )
            }
            Err(_) => (None, None),
        };

        Self {
            angle_label: angle_label(snapshot.current_angle),
            status_label: status_label(mode, side),
            quality_ok: snapshot.quality_ok,
            joints,
            bones,
            skeleton_color: SKELETON_COLOR,
            moving_axis,
            base_axis,
            rom_bar: RomBar::for_mode(mode).with_markers(snapshot.current_angle, snapshot.peak_angle),
        }
    }
}

pub fn angle_label(angle: Option<f64>) -> String {
    match angle {
        Some(a) => format!("{:.1}°", a),
        None => "--.-°".to_string(),
    }
}

pub fn status_label(mode: MeasurementMode, side: Side) -> String {
    format!("{} {}", mode.short_label(), side.short_label())
}
