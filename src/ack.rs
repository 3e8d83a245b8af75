//! 수신측 ACK 해석
//!
//! 16바이트 응답, 앞부분 ASCII 상태 코드:
//! - `OK`: 수락
//! - `OKSS` + big-endian u32: 수락 + 목표 전송 속도 (bytes/sec)
//! - 그 외 (무응답 포함): 거절

use crate::ACK_SIZE;

const OK: &[u8; 2] = b"OK";
const OKSS: &[u8; 4] = b"OKSS";

/// 응답 버퍼 초기값. 매 시도 전에 이 값으로 리셋되며 `Rejected`로 해석된다.
pub const NO_RESPONSE: [u8; ACK_SIZE] = [0u8; ACK_SIZE];

/// ACK 해석 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Accepted,
    AcceptedWithRate(u32),
    Rejected,
}

impl Ack {
    /// 응답 바이트 해석
    ///
    /// `OKSS`도 `OK`로 시작하므로 먼저 검사한다. 길이가 부족한 응답은 거절로 본다.
    pub fn parse(buf: &[u8]) -> Self {
        if buf.starts_with(OKSS) && buf.len() >= OKSS.len() + 4 {
            let mut rate = [0u8; 4];
            rate.copy_from_slice(&buf[OKSS.len()..OKSS.len() + 4]);
            return Ack::AcceptedWithRate(u32::from_be_bytes(rate));
        }

        if buf.starts_with(OK) {
            Ack::Accepted
        } else {
            Ack::Rejected
        }
    }

    pub fn is_accepted(&self) -> bool {
        !matches!(self, Ack::Rejected)
    }

    /// 속도 힌트 (있을 경우)
    pub fn rate_hint(&self) -> Option<u32> {
        match self {
            Ack::AcceptedWithRate(bps) => Some(*bps),
            _ => None,
        }
    }

    /// 수신측 와이어 포맷으로 인코딩
    pub fn to_bytes(&self) -> [u8; ACK_SIZE] {
        let mut buf = NO_RESPONSE;
        match self {
            Ack::Accepted => buf[..OK.len()].copy_from_slice(OK),
            Ack::AcceptedWithRate(bps) => {
                buf[..OKSS.len()].copy_from_slice(OKSS);
                buf[OKSS.len()..OKSS.len() + 4].copy_from_slice(&bps.to_be_bytes());
            }
            Ack::Rejected => {}
        }
        buf
    }
}
