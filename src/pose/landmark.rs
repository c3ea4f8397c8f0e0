use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 計測に使う BlazePose ランドマークのインデックス (全33点のうち上半身)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum LandmarkIndex {
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftHip = 23,
    RightHip = 24,
}

impl LandmarkIndex {
    /// 計測に必要な最小ランドマーク数 (RightHip まで)
    pub const REQUIRED: usize = 25;

    pub const ALL: [LandmarkIndex; 8] = [
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
    ];
}

/// 計測する側
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn shoulder(self) -> LandmarkIndex {
        match self {
            Side::Left => LandmarkIndex::LeftShoulder,
            Side::Right => LandmarkIndex::RightShoulder,
        }
    }

    pub fn elbow(self) -> LandmarkIndex {
        match self {
            Side::Left => LandmarkIndex::LeftElbow,
            Side::Right => LandmarkIndex::RightElbow,
        }
    }

    pub fn wrist(self) -> LandmarkIndex {
        match self {
            Side::Left => LandmarkIndex::LeftWrist,
            Side::Right => LandmarkIndex::RightWrist,
        }
    }

    pub fn hip(self) -> LandmarkIndex {
        match self {
            Side::Left => LandmarkIndex::LeftHip,
            Side::Right => LandmarkIndex::RightHip,
        }
    }

    /// 表示用の一文字ラベル ("L" / "R")
    pub fn short_label(self) -> &'static str {
        match self {
            Side::Left => "L",
            Side::Right => "R",
        }
    }

    /// CSV 出力用の名前
    pub fn name(self) -> &'static str {
        match self {
            Side::Left => "LEFT",
            Side::Right => "RIGHT",
        }
    }
}

/// 単一ランドマーク
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    /// 正規化されたX座標 (0.0〜1.0)
    pub x: f32,
    /// 正規化されたY座標 (0.0〜1.0)
    pub y: f32,
    /// 相対深度 (負ほどカメラに近い)
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// 成分ごとの中点
    pub fn midpoint(&self, other: &Landmark) -> Landmark {
        Landmark::new(
            (self.x + other.x) / 2.0,
            (self.y + other.y) / 2.0,
            (self.z + other.z) / 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("no body detected")]
    NoBody,
    #[error("landmark frame too short: {len} entries (need at least 25)")]
    TooShort { len: usize },
}

/// 検出器が1画像ごとに返すランドマーク列。人物なしは空。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkFrame {
    pub landmarks: Vec<Landmark>,
}

impl LandmarkFrame {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    /// インデックスでランドマークを取得 (範囲外は None)
    pub fn get(&self, index: LandmarkIndex) -> Option<&Landmark> {
        self.landmarks.get(index as usize)
    }

    /// 計測可能な長さか確認する
    pub fn check(&self) -> Result<(), FrameError> {
        if self.landmarks.is_empty() {
            Err(FrameError::NoBody)
        } else if self.landmarks.len() < LandmarkIndex::REQUIRED {
            Err(FrameError::TooShort {
                len: self.landmarks.len(),
            })
        } else {
            Ok(())
        }
    }

    /// 指定側の関節と両肩・両腰を取り出す
    pub fn joints(&self, side: Side) -> Result<Joints, FrameError> {
        self.check()?;
        let at = |i: LandmarkIndex| self.landmarks[i as usize];
        Ok(Joints {
            shoulder: at(side.shoulder()),
            elbow: at(side.elbow()),
            wrist: at(side.wrist()),
            hip: at(side.hip()),
            left_shoulder: at(LandmarkIndex::LeftShoulder),
            right_shoulder: at(LandmarkIndex::RightShoulder),
            left_hip: at(LandmarkIndex::LeftHip),
            right_hip: at(LandmarkIndex::RightHip),
        })
    }
}

impl From<Vec<[f32; 3]>> for LandmarkFrame {
    fn from(points: Vec<[f32; 3]>) -> Self {
        Self::new(
            points
                .into_iter()
                .map(|[x, y, z]| Landmark::new(x, y, z))
                .collect(),
        )
    }
}

/// 片側の関節と、側に依らない両肩・両腰
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joints {
    pub shoulder: Landmark,
    pub elbow: Landmark,
    pub wrist: Landmark,
    pub hip: Landmark,
    pub left_shoulder: Landmark,
    pub right_shoulder: Landmark,
    pub left_hip: Landmark,
    pub right_hip: Landmark,
}

impl Joints {
    /// 左右腰の中点
    pub fn hip_midpoint(&self) -> Landmark {
        self.left_hip.midpoint(&self.right_hip)
    }

    /// 両肩の深度差。0付近なら正面、大きいほど横向き。
    pub fn shoulder_z_diff(&self) -> f64 {
        (self.left_shoulder.z as f64 - self.right_shoulder.z as f64).abs()
    }
}
