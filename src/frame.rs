//! 프레임 코덱
//!
//! 모든 프레임은 [`FRAME_SIZE`] 바이트 고정 크기:
//!
//! | offset | 길이 | 내용 |
//! |---|---|---|
//! | 0 | 가변 | 컨트롤 명령 텍스트 또는 `"DATA"` 태그 |
//! | 4 | 4 | (데이터 전용) big-endian 청크 오프셋 |
//! | 8 | ≤ 4084 | (데이터 전용) 파일 바이트, 부족분은 0 |
//! | 4092 | 4 | 페이로드 `[0, 4092)`의 big-endian CRC32C |

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum::checksum_bytes;
use crate::transfer::ControlStep;
use crate::{Error, Result, DATA_CHUNK_SIZE, DATA_HEADER_SIZE, DATA_TAG, FRAME_SIZE, PAYLOAD_SIZE};

/// 컨트롤 명령 최대 길이 (수신측이 NUL 종단으로 읽으므로 1바이트 남김)
pub const MAX_COMMAND_LEN: usize = PAYLOAD_SIZE - 1;

/// 컨트롤 명령
///
/// 포맷 문자열 대신 명령 종류별 variant로 구성하고 직렬화 시 검증한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `NAME=<수신측 저장 경로>`
    Name(String),

    /// `SIZE=<전체 길이, 10진수>`
    Size(u64),

    /// `HASH=<파일 다이제스트, hex>`
    Hash(String),

    /// `START`
    Start,

    /// `STOP`
    Stop,
}

impl Command {
    /// 와이어 텍스트로 직렬화
    pub fn to_wire(&self) -> Result<Vec<u8>> {
        if let Command::Name(arg) | Command::Hash(arg) = self {
            if arg.contains('\0') {
                return Err(Error::InvalidCommand(format!("NUL 포함 인자: {:?}", arg)));
            }
        }

        let text = self.to_string();
        if text.len() > MAX_COMMAND_LEN {
            return Err(Error::CommandTooLong {
                len: text.len(),
                max: MAX_COMMAND_LEN,
            });
        }
        Ok(text.into_bytes())
    }

    /// 와이어 텍스트에서 파싱 (`to_wire`의 역)
    pub fn parse(text: &str) -> Result<Self> {
        match text {
            "START" => return Ok(Command::Start),
            "STOP" => return Ok(Command::Stop),
            _ => {}
        }

        let (verb, arg) = text
            .split_once('=')
            .ok_or_else(|| Error::InvalidCommand(text.to_string()))?;

        match verb {
            "NAME" => Ok(Command::Name(arg.to_string())),
            "HASH" => Ok(Command::Hash(arg.to_string())),
            "SIZE" => arg
                .parse()
                .map(Command::Size)
                .map_err(|_| Error::InvalidCommand(text.to_string())),
            _ => Err(Error::InvalidCommand(text.to_string())),
        }
    }

    /// 로그용 명령 이름
    pub fn verb(&self) -> &'static str {
        ControlStep::from(self).verb()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Name(path) => write!(f, "NAME={}", path),
            Command::Size(len) => write!(f, "SIZE={}", len),
            Command::Hash(digest) => write!(f, "HASH={}", digest),
            Command::Start => f.write_str("START"),
            Command::Stop => f.write_str("STOP"),
        }
    }
}

/// 디코딩된 프레임 내용
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameBody {
    Control(Command),

    /// `body`는 패딩을 포함한 4084바이트 전체 영역
    Data { offset: u32, body: Bytes },
}

/// 4096바이트 와이어 프레임
///
/// 재전송 시 같은 버퍼를 그대로 보내므로 `Bytes`로 보관한다.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Bytes,
}

impl Frame {
    /// 컨트롤 프레임 생성
    pub fn control(command: &Command) -> Result<Self> {
        let text = command.to_wire()?;

        let mut buf = BytesMut::zeroed(PAYLOAD_SIZE);
        buf[..text.len()].copy_from_slice(&text);
        Ok(Self::seal(buf))
    }

    /// 데이터 프레임 생성
    pub fn data(offset: u32, chunk: &[u8]) -> Result<Self> {
        if chunk.len() > DATA_CHUNK_SIZE {
            return Err(Error::ChunkTooLarge {
                len: chunk.len(),
                max: DATA_CHUNK_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(FRAME_SIZE);
        buf.put_slice(DATA_TAG);
        buf.put_u32(offset);
        buf.put_slice(chunk);
        // 마지막 청크가 짧으면 0으로 채움
        buf.put_bytes(0, PAYLOAD_SIZE - buf.len());
        Ok(Self::seal(buf))
    }

    /// 페이로드 영역에 CRC 트레일러를 붙여 완성
    fn seal(mut payload: BytesMut) -> Self {
        debug_assert_eq!(payload.len(), PAYLOAD_SIZE);
        let crc = checksum_bytes(&payload);
        payload.put_u32(crc);
        Self {
            bytes: payload.freeze(),
        }
    }

    /// 수신한 바이트에서 프레임 생성 (CRC 검증은 [`Frame::verify`])
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != FRAME_SIZE {
            return Err(Error::InvalidFrameSize {
                expected: FRAME_SIZE,
                got: bytes.len(),
            });
        }
        Ok(Self {
            bytes: Bytes::copy_from_slice(bytes),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// CRC가 덮는 페이로드 영역
    pub fn payload(&self) -> &[u8] {
        &self.bytes[..PAYLOAD_SIZE]
    }

    /// 트레일러에 기록된 CRC
    pub fn stored_crc(&self) -> u32 {
        let mut trailer = [0u8; 4];
        trailer.copy_from_slice(&self.bytes[PAYLOAD_SIZE..]);
        u32::from_be_bytes(trailer)
    }

    /// CRC 검증
    pub fn verify(&self) -> Result<()> {
        let expected = self.stored_crc();
        let got = checksum_bytes(self.payload());
        if expected != got {
            return Err(Error::CrcMismatch { expected, got });
        }
        Ok(())
    }

    pub fn is_data(&self) -> bool {
        self.bytes.starts_with(DATA_TAG)
    }

    /// CRC 검증 후 내용 디코딩
    pub fn decode(&self) -> Result<FrameBody> {
        self.verify()?;

        if self.is_data() {
            let mut offset = [0u8; 4];
            offset.copy_from_slice(&self.bytes[DATA_TAG.len()..DATA_HEADER_SIZE]);
            return Ok(FrameBody::Data {
                offset: u32::from_be_bytes(offset),
                body: self.bytes.slice(DATA_HEADER_SIZE..PAYLOAD_SIZE),
            });
        }

        let payload = self.payload();
        let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
        let text = std::str::from_utf8(&payload[..end])
            .map_err(|e| Error::InvalidCommand(format!("UTF-8 아님: {}", e)))?;
        Command::parse(text).map(FrameBody::Control)
    }

    /// 데이터 프레임 디코딩, 전체 파일 길이로 실제 청크 길이를 잘라냄
    pub fn decode_data(&self, total_len: u64) -> Result<(u32, Bytes)> {
        match self.decode()? {
            FrameBody::Data { offset, body } => {
                let remaining = total_len.saturating_sub(offset as u64);
                let len = remaining.min(DATA_CHUNK_SIZE as u64) as usize;
                Ok((offset, body.slice(..len)))
            }
            FrameBody::Control(command) => Err(Error::InvalidCommand(format!(
                "데이터 프레임 아님: {}",
                command.verb()
            ))),
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_data() { "data" } else { "control" };
        f.debug_struct("Frame")
            .field("kind", &kind)
            .field("crc", &format_args!("{:08X}", self.stored_crc()))
            .finish()
    }
}
