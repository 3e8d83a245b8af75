//! 스크립트 기반 테스트용 전송 계층

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::ack::Ack;
use crate::frame::{Frame, FrameBody};
use crate::transport::Transport;

/// 전송 시도 하나에 대한 수신측 반응
#[derive(Debug, Clone)]
pub enum Step {
    /// 이 바이트로 응답
    Reply(Vec<u8>),
    /// 응답 없음 (타임아웃까지 대기)
    Silence,
    /// 송신 자체가 실패
    SendError,
    /// 같은 응답이 두 번 도착, 두 번째는 소켓에 남음
    Duplicated(Box<Step>),
}

impl Step {
    pub fn ok() -> Self {
        Step::Reply(Ack::Accepted.to_bytes().to_vec())
    }

    pub fn okss(bps: u32) -> Self {
        Step::Reply(Ack::AcceptedWithRate(bps).to_bytes().to_vec())
    }

    pub fn reject() -> Self {
        Step::Reply(b"ERR".to_vec())
    }

    pub fn duplicated(step: Step) -> Self {
        Step::Duplicated(Box::new(step))
    }
}

/// 송신한 데이터그램을 기록하고, 스크립트 순서대로 응답하는 전송 계층
///
/// 스크립트가 끝나면 `fallback`으로 응답한다. 응답은 소켓처럼 `inbox`에 쌓이고
/// 꺼내지 않은 것은 다음 시도까지 남는다.
pub struct ScriptedTransport {
    script: VecDeque<Step>,
    fallback: Step,
    inbox: VecDeque<Vec<u8>>,
    sent: Arc<Mutex<Vec<(Instant, Vec<u8>)>>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Step>, fallback: Step) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback,
            inbox: VecDeque::new(),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 항상 `OK`로 응답
    pub fn always_ok() -> Self {
        Self::new([], Step::ok())
    }

    fn enqueue(&mut self, step: Step) {
        match step {
            Step::Reply(bytes) => self.inbox.push_back(bytes),
            Step::Duplicated(inner) => {
                self.enqueue((*inner).clone());
                self.enqueue(*inner);
            }
            Step::Silence | Step::SendError => {}
        }
    }

    /// 송신 기록 핸들 (transport를 넘긴 뒤에도 조회 가능)
    pub fn sent_log(&self) -> SentLog {
        SentLog(self.sent.clone())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&mut self, datagram: &[u8]) -> io::Result<()> {
        let step = self
            .script
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        if let Step::SendError = step {
            return Err(io::Error::new(io::ErrorKind::Other, "scripted send failure"));
        }

        self.sent
            .lock()
            .unwrap()
            .push((Instant::now(), datagram.to_vec()));
        self.enqueue(step);
        Ok(())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inbox.pop_front() {
            Some(bytes) => {
                let len = bytes.len().min(buf.len());
                buf[..len].copy_from_slice(&bytes[..len]);
                Ok(len)
            }
            None => std::future::pending().await,
        }
    }

    fn drain(&mut self) -> io::Result<usize> {
        let dropped = self.inbox.len();
        self.inbox.clear();
        Ok(dropped)
    }
}

/// 송신된 데이터그램 기록
#[derive(Clone)]
pub struct SentLog(Arc<Mutex<Vec<(Instant, Vec<u8>)>>>);

impl SentLog {
    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn datagrams(&self) -> Vec<Vec<u8>> {
        self.0.lock().unwrap().iter().map(|(_, d)| d.clone()).collect()
    }

    /// 각 데이터그램의 송신 시각 (tokio 시계)
    pub fn send_times(&self) -> Vec<Instant> {
        self.0.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    /// 송신된 프레임을 디코딩한 목록
    pub fn bodies(&self) -> Vec<FrameBody> {
        self.datagrams()
            .iter()
            .map(|d| Frame::from_bytes(d).unwrap().decode().unwrap())
            .collect()
    }
}
