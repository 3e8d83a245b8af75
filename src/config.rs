//! 프로토콜 설정

use std::net::SocketAddr;
use std::time::Duration;

use crate::{DEFAULT_RESPONSE_TIMEOUT_MS, MAX_ATTEMPTS};

/// PSI 송신 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 시도당 ACK 대기 타임아웃 (밀리초)
    pub response_timeout_ms: u64,

    /// 프레임당 최대 전송 시도 횟수
    pub max_attempts: u32,

    /// 로컬 바인드 주소
    pub bind_addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS, // 1초
            max_attempts: MAX_ATTEMPTS,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 0)),
        }
    }
}

impl Config {
    /// 새 설정 생성
    pub fn new() -> Self {
        Self::default()
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// 같은 호스트/LAN용 설정
    pub fn local() -> Self {
        Self {
            response_timeout_ms: 200,
            ..Self::default()
        }
    }

    /// 불안정한 네트워크용 설정
    pub fn unstable_network() -> Self {
        Self {
            response_timeout_ms: 2000, // 2초
            ..Self::default()
        }
    }

    /// 프리셋 이름으로 조회
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "local" => Some(Self::local()),
            "unstable" => Some(Self::unstable_network()),
            _ => None,
        }
    }
}
