// region:    --- Imports
use axum::extract::DefaultBodyLimit;
use clap::Parser;
use std::sync::Arc;
use tendering_service::clock::SystemClock;
use tendering_service::config::Config;
use tendering_service::database::DatabaseManager;
use tendering_service::handlers;
use tendering_service::message_broker::{DisabledPublisher, EventPublisher, KafkaProducer};
use tendering_service::scheduler::AuctionScheduler;
use tendering_service::state::AppState;
use tendering_service::store::{AuctionStore, MemoryStore, PgStore};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::parse();

    // 저장소 선택
    let store: Arc<dyn AuctionStore> = if config.in_memory {
        info!("{:<12} --> 메모리 저장소 사용", "Main");
        Arc::new(MemoryStore::new())
    } else {
        let url = config
            .database_url
            .as_deref()
            .ok_or("DATABASE_URL 이 설정되지 않았습니다 (--in-memory 로 실행 가능)")?;
        let db_manager = Arc::new(DatabaseManager::connect(url, config.max_connections).await?);

        // 데이터베이스 초기화
        if let Err(e) = db_manager.initialize_database(config.reset_db).await {
            error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
            return Err(e.into());
        }
        info!("{:<12} --> 데이터베이스 초기화 성공", "Main");
        Arc::new(PgStore::new(db_manager))
    };

    // 이벤트 발행
    let events: Arc<dyn EventPublisher> = match config.kafka_brokers.as_deref() {
        Some(brokers) => {
            let producer = KafkaProducer::new(brokers, &config.events_topic)?;
            if let Err(e) = producer.create_topic(5, 1).await {
                warn!("{:<12} --> Kafka 토픽 준비 실패: {:?}", "Main", e);
            }
            info!("{:<12} --> Kafka 이벤트 발행 사용: {}", "Main", producer.topic());
            Arc::new(producer)
        }
        None => {
            info!("{:<12} --> 이벤트 발행 꺼짐", "Main");
            Arc::new(DisabledPublisher)
        }
    };

    let state = AppState::new(store, Arc::new(SystemClock), events);

    // 만료 경매 정리 스케줄러
    let scheduler = AuctionScheduler::new(state.sweeper(), config.sweep_interval());
    let _scheduler_handle = scheduler.start();

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = handlers::routes(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 20));

    // 리스너 생성
    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
