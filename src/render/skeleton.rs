use crate::pose::LandmarkIndex;

/// 骨格の接続定義 (開始ランドマーク, 終了ランドマーク)
pub const SKELETON_CONNECTIONS: [(LandmarkIndex, LandmarkIndex); 8] = [
    // 肩
    (LandmarkIndex::LeftShoulder, LandmarkIndex::RightShoulder),
    // 腕
    (LandmarkIndex::LeftShoulder, LandmarkIndex::LeftElbow),
    (LandmarkIndex::LeftElbow, LandmarkIndex::LeftWrist),
    (LandmarkIndex::RightShoulder, LandmarkIndex::RightElbow),
    (LandmarkIndex::RightElbow, LandmarkIndex::RightWrist),
    // 腰
    (LandmarkIndex::LeftHip, LandmarkIndex::RightHip),
    // 胴体
    (LandmarkIndex::LeftShoulder, LandmarkIndex::LeftHip),
    (LandmarkIndex::RightShoulder, LandmarkIndex::RightHip),
];

/// 関節点・骨格線の色 (RGB)
pub const SKELETON_COLOR: u32 = 0xFFFFFF;

/// 移動軸 (上腕) の色 (RGB)
pub const MOVING_AXIS_COLOR: u32 = 0xFFC800;

/// 基本軸の色 (RGB)
pub const BASE_AXIS_COLOR: u32 = 0x00C8FF;
