//! # PSI (stop-and-wait file transfer)
//!
//! UDP 기반 단일 파일 전송 프로토콜 (송신측)
//!
//! ## 핵심 특징
//! - **고정 프레임**: 모든 프레임은 4096바이트, 마지막 4바이트는 CRC32C 트레일러
//! - **Stop-and-wait**: 프레임마다 ACK를 기다리고, 최대 8회까지 같은 프레임 재전송
//! - **수신측 속도 제어**: `OKSS` ACK에 실린 목표 bytes/sec로 전송 간격 조정
//! - **선형 세션**: NAME → SIZE → HASH → START → DATA* → STOP

pub mod ack;
pub mod checksum;
pub mod config;
pub mod digest;
pub mod error;
pub mod exchange;
pub mod frame;
pub mod rate;
pub mod stats;
pub mod transfer;
pub mod transport;

#[cfg(test)]
mod test_util;

pub use ack::Ack;
pub use config::Config;
pub use error::{Error, Result};
pub use exchange::{Delivery, ReliableExchange};
pub use frame::{Command, Frame, FrameBody};
pub use rate::RateController;
pub use stats::TransferStats;
pub use transfer::{CancelHandle, ControlStep, FileTransfer, TransferSource, TransferState};
pub use transport::{Transport, UdpTransport};

/// 프레임 전체 크기 (바이트)
pub const FRAME_SIZE: usize = 4096;

/// CRC 트레일러 크기
pub const CRC_SIZE: usize = 4;

/// CRC가 덮는 페이로드 영역 크기
pub const PAYLOAD_SIZE: usize = FRAME_SIZE - CRC_SIZE;

/// 데이터 프레임 태그
pub const DATA_TAG: &[u8; 4] = b"DATA";

/// 데이터 프레임 오프셋 필드 크기
pub const OFFSET_SIZE: usize = 4;

/// 데이터 프레임 헤더 (태그 + 오프셋)
pub const DATA_HEADER_SIZE: usize = DATA_TAG.len() + OFFSET_SIZE;

/// 데이터 프레임 하나에 실리는 최대 파일 바이트
pub const DATA_CHUNK_SIZE: usize = PAYLOAD_SIZE - DATA_HEADER_SIZE;

/// ACK 크기 (바이트)
pub const ACK_SIZE: usize = 16;

/// 프레임당 최대 전송 시도 횟수
pub const MAX_ATTEMPTS: u32 = 8;

/// 기본 수신측 포트
pub const DEFAULT_PORT: u16 = 4000;

/// 기본 ACK 대기 타임아웃 (밀리초)
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 1000;

const _: () = assert!(DATA_CHUNK_SIZE == 4084);
const _: () = assert!(DATA_HEADER_SIZE == 8);
