/// 실행 설정
/// 커맨드라인 인자와 환경 변수에서 읽는다.
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "경매(입찰) 서비스", long_about = None)]
pub struct Config {
    /// PostgreSQL 접속 URL (--in-memory 가 아니면 필수)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// 커넥션 풀 최대 크기
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// 웹 서버 바인드 주소
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:3000")]
    pub listen_addr: String,

    /// 만료 경매 정리 주기(초)
    #[arg(long, env = "SWEEP_INTERVAL_SECS", default_value_t = 60)]
    pub sweep_interval_secs: u64,

    /// Kafka 브로커 목록. 없으면 이벤트 발행을 끈다
    #[arg(long, env = "KAFKA_BROKERS")]
    pub kafka_brokers: Option<String>,

    /// 이벤트 토픽
    #[arg(long, env = "EVENTS_TOPIC", default_value = "tendering-events")]
    pub events_topic: String,

    /// 데이터베이스 대신 메모리 저장소 사용
    #[arg(long)]
    pub in_memory: bool,

    /// 시작 시 테이블을 지우고 다시 생성
    #[arg(long)]
    pub reset_db: bool,
}

impl Config {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}
