//! 파일 내용 다이제스트 (HASH 명령 인자)
//!
//! 수신측이 완성된 파일을 검증할 때 쓰는 MD5 hex 문자열. 프로토콜 안에서는
//! 불투명한 문자열로만 다룬다.

/// MD5 다이제스트, 소문자 hex 32자
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_vectors() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            md5_hex(b"The quick brown fox jumps over the lazy dog"),
            "9e107d9d372bb6826bd81d3542a419d6"
        );
        assert_eq!(md5_hex(b"abc").len(), 32);
    }
}
