//! PSI 클라이언트 (송신자)
//!
//! 파일 하나를 UDP 수신측으로 stop-and-wait 전송
//! - NAME/SIZE/HASH/START 컨트롤 프레임 → DATA 프레임 → STOP
//! - 프레임당 최대 8회 재전송, 수신측 `OKSS` 힌트로 속도 조절
//!
//! 사용법:
//!   cargo run --release --bin psi-client -- [OPTIONS]
//!
//! 예시:
//!   # 기본 전송
//!   cargo run --release --bin psi-client -- --file in.txt --dest out.txt
//!
//!   # 원격 수신측 + 불안정 네트워크 프리셋
//!   cargo run --release --bin psi-client -- -s 192.168.1.100:4000 -f in.txt --preset unstable

use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use psi::{Config, Error, FileTransfer, TransferSource, UdpTransport, DEFAULT_PORT};

const USAGE: &str = r#"PSI Client - stop-and-wait 파일 전송 클라이언트

사용법:
  cargo run --release --bin psi-client -- [OPTIONS]

옵션:
  -f, --file <PATH>      전송할 파일 (필수)
  -d, --dest <NAME>      수신측 저장 경로 (기본: 파일 이름)
  -s, --server <ADDR>    수신측 주소 (기본: 127.0.0.1:4000)
  -b, --bind <ADDR>      로컬 바인드 주소 (기본: 0.0.0.0:0 = 자동 할당)
  -t, --timeout <MS>     시도당 ACK 대기 시간 (기본: 1000)
  -p, --preset <NAME>    설정 프리셋: default | local | unstable
  -h, --help             이 도움말 출력

종료 코드:
  0    완료, 또는 컨트롤 단계 실패 (보고 후 중단)
  1    데이터 전송 실패
  130  Ctrl-C로 취소
"#;

/// 클라이언트 설정
struct ClientConfig {
    server_addr: SocketAddr,
    file_path: PathBuf,
    destination: String,
    config: Config,
}

fn parse_args() -> Result<ClientConfig, String> {
    let args: Vec<String> = std::env::args().collect();

    let mut server_addr = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT));
    let mut file_path: Option<PathBuf> = None;
    let mut destination: Option<String> = None;
    let mut bind_addr: Option<SocketAddr> = None;
    let mut timeout_ms: Option<u64> = None;
    let mut config = Config::default();

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let mut value = || {
            i += 1;
            args.get(i)
                .cloned()
                .ok_or_else(|| format!("{} 뒤에 값이 필요합니다", flag))
        };

        match flag {
            "--server" | "-s" => {
                server_addr = value()?
                    .parse()
                    .map_err(|e| format!("유효한 주소 필요: {}", e))?;
            }
            "--bind" | "-b" => {
                bind_addr = Some(
                    value()?
                        .parse()
                        .map_err(|e| format!("유효한 주소 필요: {}", e))?,
                );
            }
            "--file" | "-f" => file_path = Some(PathBuf::from(value()?)),
            "--dest" | "-d" => destination = Some(value()?),
            "--timeout" | "-t" => {
                timeout_ms = Some(
                    value()?
                        .parse()
                        .map_err(|e| format!("유효한 숫자 필요: {}", e))?,
                );
            }
            "--preset" | "-p" => {
                let name = value()?;
                config = Config::preset(&name).ok_or_else(|| format!("알 수 없는 프리셋: {}", name))?;
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other => return Err(format!("알 수 없는 옵션: {}", other)),
        }
        i += 1;
    }

    // 프리셋 위에 개별 옵션 적용
    if let Some(addr) = bind_addr {
        config.bind_addr = addr;
    }
    if let Some(ms) = timeout_ms {
        config.response_timeout_ms = ms;
    }

    let file_path = file_path.ok_or("--file 옵션이 필요합니다")?;
    let destination = match destination {
        Some(dest) => dest,
        None => file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or("파일 이름을 알 수 없습니다, --dest 지정 필요")?,
    };

    Ok(ClientConfig {
        server_addr,
        file_path,
        destination,
        config,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 로깅 설정 (RUST_LOG, 기본 info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let client_config = match parse_args() {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("{}\n\n{}", msg, USAGE);
            std::process::exit(2);
        }
    };

    info!("PSI Client starting...");
    info!("Server address: {}", client_config.server_addr);
    info!("File: {:?} -> {}", client_config.file_path, client_config.destination);
    info!("Response timeout: {}ms", client_config.config.response_timeout_ms);

    let source =
        TransferSource::from_path(&client_config.file_path, client_config.destination.clone()).await?;
    info!("File size {} bytes, hash {}", source.len(), source.digest);

    let transport =
        UdpTransport::connect(client_config.config.bind_addr, client_config.server_addr).await?;
    info!("Bound to local address: {}", transport.local_addr()?);

    let mut transfer = FileTransfer::new(transport, &client_config.config);

    // Ctrl-C: 현재 청크 이후 중단
    let cancel = transfer.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, stopping after the current chunk");
            cancel.cancel();
        }
    });

    match transfer.run(&source).await {
        Ok(stats) => {
            info!("Transfer complete!");
            info!("  {}", stats.summary());
            Ok(())
        }
        Err(e) if e.is_fatal() => {
            error!("error while sending file: {}", e);
            info!("  {}", transfer.stats().summary());
            std::process::exit(1);
        }
        Err(Error::Cancelled { offset }) => {
            warn!("Transfer cancelled after {} of {} bytes", offset, source.len());
            std::process::exit(130);
        }
        Err(e) => {
            // 컨트롤 단계 실패: 보고 후 정상 종료
            error!("{}", e);
            Ok(())
        }
    }
}
