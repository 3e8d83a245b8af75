//! 전송 통계

use std::time::{Duration, Instant};

/// 한 번의 파일 전송에 대한 통계
#[derive(Debug, Clone)]
pub struct TransferStats {
    /// 시작 시간
    pub start_time: Instant,

    /// ACK를 받은 프레임 수
    pub frames_delivered: u64,

    /// 재시도 한도를 넘긴 프레임 수
    pub frames_failed: u64,

    /// 총 전송 시도 수
    pub attempts: u64,

    /// 거절 응답 수
    pub rejected: u64,

    /// 응답 타임아웃/수신 실패 수
    pub timeouts: u64,

    /// 송신 실패 수
    pub transmit_failures: u64,

    /// ACK된 파일 바이트
    pub bytes_sent: u64,

    /// 받은 속도 힌트 수
    pub rate_hints: u64,

    /// 프레임 송신 전에 버린 늦은 응답 수
    pub stale_acks: u64,

    /// 속도 제어로 대기한 총 시간
    pub paced: Duration,
}

impl TransferStats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            frames_delivered: 0,
            frames_failed: 0,
            attempts: 0,
            rejected: 0,
            timeouts: 0,
            transmit_failures: 0,
            bytes_sent: 0,
            rate_hints: 0,
            stale_acks: 0,
            paced: Duration::ZERO,
        }
    }

    /// 경과 시간
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 첫 시도 이후의 재전송 수
    pub fn retries(&self) -> u64 {
        self.attempts
            .saturating_sub(self.frames_delivered + self.frames_failed)
    }

    /// 실효 처리율 (bytes/sec)
    pub fn throughput(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed == 0.0 {
            return 0.0;
        }
        self.bytes_sent as f64 / elapsed
    }

    /// 통계 요약 문자열
    pub fn summary(&self) -> String {
        format!(
            "Elapsed: {:.2}s | Frames: {} | Attempts: {} (retries {}) | Bytes: {} | Throughput: {:.2} KB/s | Rejected: {} | Timeouts: {} | Paced: {:.2}s",
            self.elapsed().as_secs_f64(),
            self.frames_delivered,
            self.attempts,
            self.retries(),
            self.bytes_sent,
            self.throughput() / 1_000.0,
            self.rejected,
            self.timeouts,
            self.paced.as_secs_f64(),
        )
    }
}

impl Default for TransferStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_exclude_first_attempts() {
        let mut stats = TransferStats::new();
        stats.attempts = 12;
        stats.frames_delivered = 3;
        stats.frames_failed = 1;
        assert_eq!(stats.retries(), 8);
    }

    #[test]
    fn test_summary_mentions_counters() {
        let mut stats = TransferStats::new();
        stats.frames_delivered = 8;
        stats.attempts = 8;
        stats.bytes_sent = 10000;
        let summary = stats.summary();
        assert!(summary.contains("Frames: 8"));
        assert!(summary.contains("Bytes: 10000"));
        assert!(summary.contains("retries 0"));
    }
}
