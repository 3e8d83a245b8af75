//! 신뢰 교환: 프레임 전송 → ACK 대기 → 최대 N회 재시도
//!
//! 컨트롤 프레임과 데이터 프레임 모두 같은 경로를 쓴다. 일시적 실패
//! (송신 실패, 무응답, 거절)는 여기서 흡수되고, 밖으로는 재시도 한도 초과만 나간다.

use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::ack::{Ack, NO_RESPONSE};
use crate::frame::Frame;
use crate::stats::TransferStats;
use crate::transport::Transport;
use crate::{Config, Error, Result};

/// 시도 하나의 실패 원인 (재시도 대상)
#[derive(Error, Debug)]
pub enum AttemptError {
    #[error("송신 실패: {0}")]
    TransmitFailure(#[source] io::Error),

    #[error("응답 없음: {0}")]
    NoResponse(String),

    #[error("거절 응답: {0:?}")]
    Rejected(String),
}

/// 수락된 전송 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// `Accepted` 또는 `AcceptedWithRate`
    pub ack: Ack,

    /// 수락까지 걸린 시도 횟수 (1부터)
    pub attempts: u32,
}

impl Delivery {
    pub fn rate_hint(&self) -> Option<u32> {
        self.ack.rate_hint()
    }
}

/// 전송 계층 위의 stop-and-wait 재전송
pub struct ReliableExchange<T> {
    transport: T,
    max_attempts: u32,
    response_timeout: Duration,
    stats: TransferStats,
}

impl<T: Transport> ReliableExchange<T> {
    pub fn new(transport: T, config: &Config) -> Self {
        Self {
            transport,
            max_attempts: config.max_attempts.max(1),
            response_timeout: config.response_timeout(),
            stats: TransferStats::new(),
        }
    }

    /// 프레임이 수락될 때까지 같은 프레임을 재전송
    ///
    /// 첫 송신 전에 소켓에 쌓인 응답을 비운다. 이전 프레임의 늦은 ACK가
    /// 이 프레임의 수락으로 읽히면 안 된다.
    pub async fn send(&mut self, frame: &Frame) -> Result<Delivery> {
        match self.transport.drain() {
            Ok(0) => {}
            Ok(n) => {
                self.stats.stale_acks += n as u64;
                debug!("이전 프레임의 늦은 응답 {}개 폐기", n);
            }
            Err(e) => warn!("수신 대기열 비우기 실패: {}", e),
        }

        for attempt in 1..=self.max_attempts {
            self.stats.attempts += 1;

            match self.attempt(frame).await {
                Ok(ack) => {
                    self.stats.frames_delivered += 1;
                    if ack.rate_hint().is_some() {
                        self.stats.rate_hints += 1;
                    }
                    return Ok(Delivery {
                        ack,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    match &e {
                        AttemptError::TransmitFailure(_) => self.stats.transmit_failures += 1,
                        AttemptError::NoResponse(_) => self.stats.timeouts += 1,
                        AttemptError::Rejected(_) => self.stats.rejected += 1,
                    }
                    warn!("시도 {}/{} 실패: {:?}: {}", attempt, self.max_attempts, frame, e);
                }
            }
        }

        self.stats.frames_failed += 1;
        error!("{:?}: {}회 시도 모두 실패", frame, self.max_attempts);
        Err(Error::RetryExhausted {
            attempts: self.max_attempts,
        })
    }

    async fn attempt(&mut self, frame: &Frame) -> std::result::Result<Ack, AttemptError> {
        // 이전 프레임의 응답이 남아 수락으로 오인되지 않도록 매번 리셋
        let mut response = NO_RESPONSE;

        self.transport
            .send(frame.as_bytes())
            .await
            .map_err(AttemptError::TransmitFailure)?;

        let len = match timeout(self.response_timeout, self.transport.recv(&mut response)).await {
            Ok(Ok(len)) => len,
            Ok(Err(e)) => return Err(AttemptError::NoResponse(e.to_string())),
            Err(_) => {
                return Err(AttemptError::NoResponse(format!(
                    "{}ms 타임아웃",
                    self.response_timeout.as_millis()
                )))
            }
        };

        let text = String::from_utf8_lossy(&response[..len]);
        let text = text.trim_end_matches('\0');
        debug!("Receive response from server: {:?}", text);

        match Ack::parse(&response[..len]) {
            Ack::Rejected => Err(AttemptError::Rejected(text.to_string())),
            ack => Ok(ack),
        }
    }

    pub fn stats(&self) -> &TransferStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut TransferStats {
        &mut self.stats
    }

}
