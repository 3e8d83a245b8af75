//! CRC-32C (Castagnoli) 프레임 체크섬
//!
//! 반사 다항식 `0x82F63B78`, 초기값 `!0`, 최종 보수. 수신측이 같은 알고리즘으로
//! 검증하므로 비트 단위로 일치해야 한다.

use crc::{Crc, CRC_32_ISCSI};

use crate::PAYLOAD_SIZE;

const CASTAGNOLI: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

/// 프레임 페이로드 영역의 체크섬
pub fn checksum(payload: &[u8; PAYLOAD_SIZE]) -> u32 {
    checksum_bytes(payload)
}

/// 임의 길이 바이트열의 CRC-32C
pub fn checksum_bytes(data: &[u8]) -> u32 {
    CASTAGNOLI.checksum(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 바이트 단위, LSB 우선 비트 루프
    fn bitwise_crc32c(data: &[u8]) -> u32 {
        let mut crc = !0u32;
        for &byte in data {
            crc ^= byte as u32;
            for _ in 0..8 {
                crc = if crc & 1 != 0 {
                    (crc >> 1) ^ 0x82F6_3B78
                } else {
                    crc >> 1
                };
            }
        }
        !crc
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(checksum_bytes(b""), 0x0000_0000);
        assert_eq!(checksum_bytes(b"123456789"), 0xE306_9283);
        assert_eq!(checksum_bytes(b"a"), 0xC1D0_4330);
        // RFC 3720 B.4: 32바이트 0x00 / 0xFF
        assert_eq!(checksum_bytes(&[0u8; 32]), 0x8A91_36AA);
        assert_eq!(checksum_bytes(&[0xFFu8; 32]), 0x62A8_AB43);
    }

    #[test]
    fn test_matches_bitwise_reference() {
        let mut payload = [0u8; PAYLOAD_SIZE];
        for (i, b) in payload.iter_mut().enumerate() {
            *b = (i * 31 % 251) as u8;
        }
        assert_eq!(checksum(&payload), bitwise_crc32c(&payload));
        assert_eq!(checksum(&[0u8; PAYLOAD_SIZE]), bitwise_crc32c(&[0u8; PAYLOAD_SIZE]));
    }
}
