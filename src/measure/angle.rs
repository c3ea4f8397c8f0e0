//! 肩関節角度の計算
//!
//! ランドマーク1フレームから、選択した側・計測モードの角度 (度) を求める。
//! 視点が計測モードに合わないフレームは `None` として捨てる:
//! 外転は前額面の運動なので正面から、屈曲・伸展は矢状面なので側面から計測する。

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::pose::{FrameError, Joints, Landmark, LandmarkFrame, Side};

/// 外転の正面判定: 両肩の深度差の上限
pub const ABDUCTION_MAX_Z_DIFF: f64 = 0.12;
/// 屈曲・伸展の側面判定: 両肩の深度差の下限
pub const SAGITTAL_MIN_Z_DIFF: f64 = 0.10;
/// 伸展とみなす最小の後方移動量
pub const EXTENSION_MIN_DEPTH: f64 = 0.01;
/// 腕がほぼ垂直なときの分母の下駄
pub const EXTENSION_VERTICAL_BIAS: f64 = 0.01;
pub const EXTENSION_MAX_DEGREES: f64 = 50.0;
pub const VERTEX_MAX_DEGREES: f64 = 180.0;

/// これより短いベクトルは角度を定義できない
const MIN_RAY_LENGTH: f64 = 1e-9;

/// 計測モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MeasurementMode {
    /// 外転 (側方挙上)
    Abduction,
    /// 屈曲 (前方挙上)
    Flexion,
    /// 伸展 (後方挙上)
    Extension,
}

impl MeasurementMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Abduction => "ABDUCTION",
            Self::Flexion => "FLEXION",
            Self::Extension => "EXTENSION",
        }
    }

    /// 表示用の3文字ラベル
    pub fn short_label(self) -> &'static str {
        &self.name()[..3]
    }

    /// 矢状面の運動か (側面からの計測が必要)
    pub fn is_sagittal(self) -> bool {
        matches!(self, Self::Flexion | Self::Extension)
    }
}

/// 射影面
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plane {
    /// 画像平面 (x, y)
    Frontal,
    /// 深度-垂直面 (y, z)
    Sagittal,
}

impl Plane {
    fn project(self, p: &Landmark) -> [f64; 2] {
        match self {
            Plane::Frontal => [p.x as f64, p.y as f64],
            Plane::Sagittal => [p.y as f64, p.z as f64],
        }
    }
}

/// 視点判定と伸展計算の定数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleParams {
    pub abduction_max_z_diff: f64,
    pub sagittal_min_z_diff: f64,
    pub extension_min_depth: f64,
    pub extension_vertical_bias: f64,
    pub extension_max_degrees: f64,
}

impl AngleParams {
    pub fn from_config(config: &Config) -> Self {
        Self {
            abduction_max_z_diff: config.gate.abduction_max_z_diff,
            sagittal_min_z_diff: config.gate.sagittal_min_z_diff,
            extension_min_depth: config.extension.min_depth,
            extension_vertical_bias: config.extension.vertical_bias,
            extension_max_degrees: config.extension.max_degrees,
        }
    }
}

impl Default for AngleParams {
    fn default() -> Self {
        Self {
            abduction_max_z_diff: ABDUCTION_MAX_Z_DIFF,
            sagittal_min_z_diff: SAGITTAL_MIN_Z_DIFF,
            extension_min_depth: EXTENSION_MIN_DEPTH,
            extension_vertical_bias: EXTENSION_VERTICAL_BIAS,
            extension_max_degrees: EXTENSION_MAX_DEGREES,
        }
    }
}

/// 角度計算器 (状態を持たない)
#[derive(Debug, Clone, Copy, Default)]
pub struct AngleCalculator {
    params: AngleParams,
}

impl AngleCalculator {
    pub fn new(params: AngleParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(AngleParams::from_config(config))
    }

    pub fn params(&self) -> &AngleParams {
        &self.params
    }

    /// モードごとの有効範囲 (度)
    pub fn range(&self, mode: MeasurementMode) -> (f64, f64) {
        match mode {
            MeasurementMode::Extension => (0.0, self.params.extension_max_degrees),
            _ => (0.0, VERTEX_MAX_DEGREES),
        }
    }

    pub fn clamp(&self, mode: MeasurementMode, degrees: f64) -> f64 {
        let (lo, hi) = self.range(mode);
        degrees.clamp(lo, hi)
    }

    /// 角度を計算する。計測できないフレーム・不正なフレームはどちらも `None`。
    pub fn compute(&self, frame: &LandmarkFrame, side: Side, mode: MeasurementMode) -> Option<f64> {
        self.measure(frame, side, mode).ok().flatten()
    }

    /// 不正なフレーム (`FrameError`) と計測不能 (`Ok(None)`) を区別して返す
    pub fn measure(
        &self,
        frame: &LandmarkFrame,
        side: Side,
        mode: MeasurementMode,
    ) -> Result<Option<f64>, FrameError> {
        let joints = frame.joints(side)?;

        if !self.view_ok(&joints, mode) {
            log::debug!(
                "{} {}: view rejected (shoulder z diff {:.3})",
                mode.name(),
                side.name(),
                joints.shoulder_z_diff()
            );
            return Ok(None);
        }

        let degrees = match mode {
            MeasurementMode::Abduction => Self::arm_trunk_angle(&joints, Plane::Frontal),
            MeasurementMode::Flexion => Self::arm_trunk_angle(&joints, Plane::Sagittal),
            MeasurementMode::Extension => self.extension_angle(&joints),
        };
        // 座標に NaN/inf が混じったフレームは退化扱い
        Ok(degrees.filter(|d| d.is_finite()).map(|d| self.clamp(mode, d)))
    }

    /// 視点判定
    fn view_ok(&self, joints: &Joints, mode: MeasurementMode) -> bool {
        let z_diff = joints.shoulder_z_diff();
        if mode.is_sagittal() {
            z_diff >= self.params.sagittal_min_z_diff
        } else {
            z_diff <= self.params.abduction_max_z_diff
        }
    }

    /// 肩を頂点とした 肘-肩-腰中点 の角度
    fn arm_trunk_angle(joints: &Joints, plane: Plane) -> Option<f64> {
        let hip_mid = joints.hip_midpoint();
        vertex_angle(
            plane.project(&joints.elbow),
            plane.project(&joints.shoulder),
            plane.project(&hip_mid),
        )
    }

    /// 伸展: 垂直からの肘の後方への傾き
    fn extension_angle(&self, joints: &Joints) -> Option<f64> {
        // dy > 0: 肘が肩より下。dz > 0 を後方への挙上とみなす
        let dy = joints.elbow.y as f64 - joints.shoulder.y as f64;
        let dz = joints.shoulder.z as f64 - joints.elbow.z as f64;
        if !(dz >= self.params.extension_min_depth) {
            return None;
        }
        Some(dz.atan2(dy.abs() + self.params.extension_vertical_bias).to_degrees())
    }
}

/// 頂点 b における a-b-c の角度 (度)
///
/// cos(θ) = (BA · BC) / (|BA| |BC|)。cos は [-1, 1] に丸めてから acos する。
/// どちらかのベクトルがほぼ長さ0なら `None`。
pub fn vertex_angle(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> Option<f64> {
    let ba = [a[0] - b[0], a[1] - b[1]];
    let bc = [c[0] - b[0], c[1] - b[1]];

    let norm_a = ba[0].hypot(ba[1]);
    let norm_c = bc[0].hypot(bc[1]);
    // NaN も弾くため否定形で比較する
    if !(norm_a >= MIN_RAY_LENGTH && norm_c >= MIN_RAY_LENGTH) {
        return None;
    }

    let dot = ba[0] * bc[0] + ba[1] * bc[1];
    let cos = (dot / (norm_a * norm_c)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// デフォルト定数で角度を計算する
pub fn compute_angle(frame: &LandmarkFrame, side: Side, mode: MeasurementMode) -> Option<f64> {
    AngleCalculator::default().compute(frame, side, mode)
}
