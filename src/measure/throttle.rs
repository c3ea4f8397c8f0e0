/// 一定間隔でのみフレームを通すスロットル
///
/// 検出器のコールバック頻度に関係なく、計測を `interval_ms` ごとに1回に揃える。
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    interval_ms: u64,
    last_accepted: Option<u64>,
}

impl FrameThrottle {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_accepted: None,
        }
    }

    /// `now_ms` のフレームを処理すべきか。処理する場合は時刻を記録する。
    pub fn ready(&mut self, now_ms: u64) -> bool {
        let accept = match self.last_accepted {
            None => true,
            // 時刻が巻き戻った場合は基準を取り直す
            Some(last) if now_ms < last => true,
            Some(last) => now_ms - last >= self.interval_ms,
        };
        if accept {
            self.last_accepted = Some(now_ms);
        }
        accept
    }
}
