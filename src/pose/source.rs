//! JSON Lines 形式のランドマーク記録の読み込み。
//!
//! 1行1フレーム: `{"timestamp_ms": 1700000000000, "landmarks": [[x, y, z], ...]}`。
//! 人物が検出されなかったフレームは `landmarks` が空配列。

use serde::{Deserialize, Serialize};
use std::io::{self, BufRead};
use thiserror::Error;

use super::landmark::LandmarkFrame;

/// 記録ファイルの1行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    pub timestamp_ms: u64,
    #[serde(default)]
    pub landmarks: Vec<[f32; 3]>,
}

impl FrameRecord {
    pub fn into_frame(self) -> (u64, LandmarkFrame) {
        (self.timestamp_ms, LandmarkFrame::from(self.landmarks))
    }
}

#[derive(Debug, Error)]
pub enum RecordError {
    /// 入力自体が読めない。以降の行も読めないので読み込みを止める。
    #[error("failed to read line {line}")]
    Io {
        line: usize,
        #[source]
        source: io::Error,
    },
    /// その行だけが壊れている。読み飛ばして続行できる。
    #[error("invalid frame record at line {line}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl RecordError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RecordError::Decode { .. })
    }
}

/// 行単位でフレームを読み出すイテレータ。空行は読み飛ばす。
pub struct FrameReader<R> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = Result<FrameRecord, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            self.line_no += 1;
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(source) => {
                    return Some(Err(RecordError::Io {
                        line: self.line_no,
                        source,
                    }))
                }
            }
            if self.buf.trim().is_empty() {
                continue;
            }
            let line = self.line_no;
            return Some(
                serde_json::from_str(self.buf.trim())
                    .map_err(|source| RecordError::Decode { line, source }),
            );
        }
    }
}
