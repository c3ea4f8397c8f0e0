use crate::config::SmoothConfig;

/// 角度のEMA平滑化フィルタ
///
/// smoothed = alpha * raw + (1 - alpha) * prev。初回は raw をそのまま返す。
#[derive(Debug, Clone)]
pub struct EmaSmoother {
    alpha: f64,
    prev: Option<f64>,
}

impl EmaSmoother {
    /// `alpha` は 0 < alpha <= 1。0 だと初回値から動かなくなる。
    pub fn new(alpha: f64) -> Self {
        debug_assert!(alpha > 0.0 && alpha <= 1.0, "EMA alpha out of range: {}", alpha);
        Self { alpha, prev: None }
    }

    pub fn from_config(config: &SmoothConfig) -> Self {
        Self::new(config.alpha)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// 直前の平滑化値 (未初期化なら None)
    pub fn value(&self) -> Option<f64> {
        self.prev
    }

    pub fn apply(&mut self, raw: f64) -> f64 {
        let smoothed = match self.prev {
            Some(prev) => self.alpha * raw + (1.0 - self.alpha) * prev,
            None => raw,
        };
        self.prev = Some(smoothed);
        smoothed
    }

    pub fn reset(&mut self) {
        self.prev = None;
    }
}
