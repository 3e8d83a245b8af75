//! 에러 타입 정의

use thiserror::Error;

use crate::transfer::ControlStep;

/// PSI 프로토콜 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO 에러: {0}")]
    Io(#[from] std::io::Error),

    #[error("재시도 한도 초과: {attempts}회 시도 후 ACK 없음")]
    RetryExhausted { attempts: u32 },

    #[error("속도 힌트가 0 bytes/sec")]
    RateDivideByZero,

    #[error("청크 크기 초과: {len} > {max}")]
    ChunkTooLarge { len: usize, max: usize },

    #[error("명령 길이 초과: {len} > {max}")]
    CommandTooLong { len: usize, max: usize },

    #[error("유효하지 않은 명령: {0}")]
    InvalidCommand(String),

    #[error("유효하지 않은 프레임 크기: expected {expected}, got {got}")]
    InvalidFrameSize { expected: usize, got: usize },

    #[error("CRC 불일치: expected {expected:08X}, got {got:08X}")]
    CrcMismatch { expected: u32, got: u32 },

    #[error("파일 크기 초과: {len} bytes (오프셋 필드는 32비트)")]
    FileTooLarge { len: u64 },

    #[error("{step} 단계 전송 실패: {source}")]
    ControlAborted {
        step: ControlStep,
        #[source]
        source: Box<Error>,
    },

    #[error("데이터 전송 실패: offset={offset}: {source}")]
    DataTransferFailed {
        offset: u64,
        #[source]
        source: Box<Error>,
    },

    #[error("전송 취소됨: offset={offset}")]
    Cancelled { offset: u64 },
}

impl Error {
    /// 프로세스를 비정상 종료해야 하는 에러인지 여부
    ///
    /// 데이터 단계 실패만 치명적이다. 컨트롤 단계 실패는 보고 후 중단한다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::DataTransferFailed { .. })
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, Error>;
