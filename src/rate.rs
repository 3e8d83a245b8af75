//! 수신측 속도 힌트 → 전송 간격 변환
//!
//! `delay = round(FRAME_SIZE / bps * 1000)` ms. 고정 4096바이트 프레임 하나를
//! 요청 속도로 보낼 때 걸리는 시간. 평활화, 상한/하한 없음.

use std::time::Duration;

use tracing::{info, warn};

use crate::{Error, Result, FRAME_SIZE};

/// 속도 힌트에 해당하는 프레임 간 대기 시간
pub fn delay_for_rate(bps: u32) -> Result<Duration> {
    if bps == 0 {
        return Err(Error::RateDivideByZero);
    }
    let ms = (FRAME_SIZE as f64 / bps as f64 * 1000.0).round();
    Ok(Duration::from_millis(ms as u64))
}

/// 현재 전송 간격 보관. 새 `OKSS` 힌트가 올 때만 바뀐다.
#[derive(Debug, Clone, Default)]
pub struct RateController {
    delay: Duration,
    last_rate: Option<u32>,
}

impl RateController {
    pub fn new() -> Self {
        Self::default()
    }

    /// 새 속도 힌트 반영
    ///
    /// 0이면 에러를 돌려주고 기존 간격을 유지한다.
    pub fn update(&mut self, bps: u32) -> Result<Duration> {
        match delay_for_rate(bps) {
            Ok(delay) => {
                if self.delay != delay {
                    info!(
                        "전송 간격 변경: {}ms → {}ms ({} bytes/sec)",
                        self.delay.as_millis(),
                        delay.as_millis(),
                        bps
                    );
                }
                self.delay = delay;
                self.last_rate = Some(bps);
                Ok(delay)
            }
            Err(e) => {
                warn!("속도 힌트 무시: {} (간격 {}ms 유지)", e, self.delay.as_millis());
                Err(e)
            }
        }
    }

    /// 데이터 프레임 사이에 적용할 간격
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// 마지막으로 적용된 속도 힌트
    pub fn last_rate(&self) -> Option<u32> {
        self.last_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_formula() {
        assert_eq!(delay_for_rate(4096).unwrap(), Duration::from_millis(1000));
        assert_eq!(delay_for_rate(8192).unwrap(), Duration::from_millis(500));
        assert_eq!(delay_for_rate(2048).unwrap(), Duration::from_millis(2000));
        // 4096 / 3000 * 1000 = 1365.33
        assert_eq!(delay_for_rate(3000).unwrap(), Duration::from_millis(1365));
        // 4096 / 6000 * 1000 = 682.67
        assert_eq!(delay_for_rate(6000).unwrap(), Duration::from_millis(683));
        assert_eq!(delay_for_rate(u32::MAX).unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_zero_rate_is_error() {
        assert!(matches!(delay_for_rate(0), Err(Error::RateDivideByZero)));
    }

    #[test]
    fn test_zero_rate_keeps_previous_delay() {
        let mut rate = RateController::new();
        assert_eq!(rate.delay(), Duration::ZERO);

        rate.update(8192).unwrap();
        assert!(rate.update(0).is_err());
        assert_eq!(rate.delay(), Duration::from_millis(500));
        assert_eq!(rate.last_rate(), Some(8192));
    }
}
