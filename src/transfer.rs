//! 전송 오케스트레이터
//!
//! 상태 머신 (분기 없음, 실패 시 종료):
//!
//! ```text
//! INIT → SEND_NAME → SEND_SIZE → SEND_HASH → SEND_START → {TRANSFER_CHUNK}* → SEND_STOP → DONE
//! ```
//!
//! - 컨트롤 단계 실패: [`Error::ControlAborted`] (보고 후 중단)
//! - 데이터 단계 실패: [`Error::DataTransferFailed`] (치명적, 프로세스 종료 대상)

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, info};

use crate::digest::md5_hex;
use crate::exchange::{Delivery, ReliableExchange};
use crate::frame::{Command, Frame};
use crate::rate::RateController;
use crate::stats::TransferStats;
use crate::transport::Transport;
use crate::{Config, Error, Result, DATA_CHUNK_SIZE};

/// 진행률 로그 간격
const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

/// 컨트롤 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStep {
    Name,
    Size,
    Hash,
    Start,
    Stop,
}

impl ControlStep {
    /// 와이어 명령 이름
    pub fn verb(self) -> &'static str {
        match self {
            ControlStep::Name => "NAME",
            ControlStep::Size => "SIZE",
            ControlStep::Hash => "HASH",
            ControlStep::Start => "START",
            ControlStep::Stop => "STOP",
        }
    }
}

impl From<&Command> for ControlStep {
    fn from(command: &Command) -> Self {
        match command {
            Command::Name(_) => ControlStep::Name,
            Command::Size(_) => ControlStep::Size,
            Command::Hash(_) => ControlStep::Hash,
            Command::Start => ControlStep::Start,
            Command::Stop => ControlStep::Stop,
        }
    }
}

impl fmt::Display for ControlStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// 세션 상태 머신 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Init,
    Control(ControlStep),
    TransferChunk,
    Done,
    Failed,
}

/// 전송할 파일
#[derive(Debug, Clone)]
pub struct TransferSource {
    /// 수신측 저장 경로 (`NAME=`)
    pub destination: String,

    /// 파일 내용
    pub data: Bytes,

    /// 내용 다이제스트 (`HASH=`)
    pub digest: String,
}

impl TransferSource {
    pub fn new(destination: impl Into<String>, data: impl Into<Bytes>, digest: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            data: data.into(),
            digest: digest.into(),
        }
    }

    /// 파일을 읽고 MD5 다이제스트 계산
    pub async fn from_path(path: impl AsRef<Path>, destination: impl Into<String>) -> Result<Self> {
        let data = tokio::fs::read(path.as_ref()).await?;
        let digest = md5_hex(&data);
        Ok(Self::new(destination, data, digest))
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// 데이터 오프셋 필드가 32비트이므로 그 이상은 거부
pub fn validate_len(len: u64) -> Result<()> {
    if len > u32::MAX as u64 {
        return Err(Error::FileTooLarge { len });
    }
    Ok(())
}

/// 청크 사이 협조적 취소 핸들
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 한 번의 전송 동안 유지되는 세션 상태
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// 이미 ACK된 바이트 수
    pub offset: u64,

    /// 데이터 프레임 사이 간격
    pub rate: RateController,
}

/// 단일 파일 송신기
pub struct FileTransfer<T> {
    exchange: ReliableExchange<T>,
    session: SessionState,
    state: TransferState,
    cancel: CancelHandle,
}

impl<T: Transport> FileTransfer<T> {
    pub fn new(transport: T, config: &Config) -> Self {
        Self {
            exchange: ReliableExchange::new(transport, config),
            session: SessionState::default(),
            state: TransferState::Init,
            cancel: CancelHandle::new(),
        }
    }

    /// 취소 핸들 (다른 태스크에서 `cancel()` 호출)
    ///
    /// 취소 요청은 그것을 관찰한 `run`에서 소비된다. 다음 `run`은 새로 시작한다.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn stats(&self) -> &TransferStats {
        self.exchange.stats()
    }

    /// 파일 전송 실행
    ///
    /// 세션 상태와 통계는 전송마다 새로 만든다.
    pub async fn run(&mut self, source: &TransferSource) -> Result<TransferStats> {
        self.session = SessionState::default();
        self.state = TransferState::Init;
        *self.exchange.stats_mut() = TransferStats::new();

        let result = self.drive(source).await;
        if let Err(Error::Cancelled { .. }) = result {
            self.cancel.clear();
        }
        self.state = if result.is_ok() {
            TransferState::Done
        } else {
            TransferState::Failed
        };
        result.map(|()| self.exchange.stats().clone())
    }

    async fn drive(&mut self, source: &TransferSource) -> Result<()> {
        let total = source.len();
        validate_len(total)?;

        info!(
            "전송 시작: {} ({} bytes, hash={})",
            source.destination, total, source.digest
        );

        self.send_control(Command::Name(source.destination.clone())).await?;
        self.send_control(Command::Size(total)).await?;
        self.send_control(Command::Hash(source.digest.clone())).await?;
        self.send_control(Command::Start).await?;

        self.transfer_chunks(&source.data).await?;

        self.send_control(Command::Stop).await?;

        info!("전송 완료: {}", self.exchange.stats().summary());
        Ok(())
    }

    async fn send_control(&mut self, command: Command) -> Result<()> {
        let step = ControlStep::from(&command);
        self.state = TransferState::Control(step);

        let abort = move |e: Error| Error::ControlAborted {
            step,
            source: Box::new(e),
        };

        let frame = Frame::control(&command).map_err(abort)?;
        debug!("{} 프레임 전송: {}", step, command);

        let delivery = self.exchange.send(&frame).await.map_err(abort)?;
        self.apply_rate_hint(&delivery);
        Ok(())
    }

    async fn transfer_chunks(&mut self, data: &[u8]) -> Result<()> {
        self.state = TransferState::TransferChunk;

        let total = data.len() as u64;
        let mut last_progress = Instant::now();

        while self.session.offset < total {
            let offset = self.session.offset;
            if self.cancel.is_cancelled() {
                info!("전송 취소: offset={}", offset);
                return Err(Error::Cancelled { offset });
            }

            let fatal = move |e: Error| Error::DataTransferFailed {
                offset,
                source: Box::new(e),
            };

            let start = offset as usize;
            let end = (start + DATA_CHUNK_SIZE).min(data.len());
            let chunk = &data[start..end];

            // validate_len 이후이므로 u32 범위
            let frame = Frame::data(offset as u32, chunk).map_err(fatal)?;
            let delivery = self.exchange.send(&frame).await.map_err(fatal)?;

            self.session.offset += chunk.len() as u64;
            self.exchange.stats_mut().bytes_sent += chunk.len() as u64;
            self.apply_rate_hint(&delivery);

            debug!(
                "청크 전송: offset={}, len={}, attempts={}",
                offset,
                chunk.len(),
                delivery.attempts
            );

            if last_progress.elapsed() > PROGRESS_INTERVAL {
                info!(
                    "Progress: {}/{} bytes ({:.1}%)",
                    self.session.offset,
                    total,
                    self.session.offset as f64 / total as f64 * 100.0
                );
                last_progress = Instant::now();
            }

            // 다음 청크 전에 수신측이 요청한 간격 적용
            let delay = self.session.rate.delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
                self.exchange.stats_mut().paced += delay;
            }
        }

        Ok(())
    }

    fn apply_rate_hint(&mut self, delivery: &Delivery) {
        if let Some(bps) = delivery.rate_hint() {
            // 0 힌트: 경고는 RateController가 남기고 기존 간격 유지
            if let Err(e) = self.session.rate.update(bps) {
                debug!("힌트 {} 미적용, 간격 {}ms 유지: {}", bps, self.session.rate.delay().as_millis(), e);
            }
        }
    }
}
