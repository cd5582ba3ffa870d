/// 경매 이벤트 발행
/// 브로커가 설정되어 있으면 Kafka 로, 아니면 아무 것도 하지 않는다.
/// 발행 실패는 입찰/정리 결과를 바꾸지 않고 로그만 남긴다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::error::{Error, Result};
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::KafkaResult;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// region:    --- Event Publisher
/// 이벤트 발행 트레이트
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &AuctionEvent) -> Result<()>;

    /// 발행하고 실패하면 경고만 남김
    async fn publish_and_log(&self, event: &AuctionEvent) {
        if let Err(e) = self.publish(event).await {
            warn!(
                "{:<12} --> {} 이벤트 발행 실패 (lot {}): {}",
                "Producer",
                event.event_type(),
                event.lot_id(),
                e
            );
        }
    }
}

/// 브로커 없이 실행할 때 쓰는 발행기
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledPublisher;

#[async_trait]
impl EventPublisher for DisabledPublisher {
    async fn publish(&self, event: &AuctionEvent) -> Result<()> {
        debug!(
            "{:<12} --> 이벤트 발행 비활성화: {} (lot {})",
            "Producer",
            event.event_type(),
            event.lot_id()
        );
        Ok(())
    }
}
// endregion: --- Event Publisher

// region:    --- Kafka Producer
#[derive(Clone)]
pub struct KafkaProducer {
    producer: Arc<FutureProducer>,
    brokers: String,
    topic: String,
}

/// KafkaProducer 구현
impl KafkaProducer {
    pub fn new(brokers: &str, topic: &str) -> KafkaResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(KafkaProducer {
            producer: Arc::new(producer),
            brokers: brokers.to_string(),
            topic: topic.to_string(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// 메시지 전송
    pub async fn send_message(&self, key: &str, value: &str) -> Result<()> {
        info!(
            "{:<12} --> Kafka 메시지 전송: topic={}, key={}",
            "Producer", self.topic, key
        );
        let record = FutureRecord::to(&self.topic).key(key).payload(value);

        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| Error::Event(format!("{:?}", e)))?;

        Ok(())
    }

    /// 토픽 생성 (이미 있으면 경고만 남김)
    pub async fn create_topic(&self, num_partitions: i32, replication_factor: i32) -> Result<()> {
        info!("{:<12} --> Kafka 토픽 생성 시작: {}", "Producer", self.topic);

        let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()
            .map_err(|e| Error::Event(format!("AdminClient 생성 실패: {:?}", e)))?;

        let new_topic = NewTopic::new(
            &self.topic,
            num_partitions,
            TopicReplication::Fixed(replication_factor),
        );

        let results = admin_client
            .create_topics(&[new_topic], &AdminOptions::new())
            .await
            .map_err(|e| {
                error!("{:<12} --> Kafka 토픽 생성 실패: {:?}", "Producer", e);
                Error::Event(format!("토픽 생성 실패: {:?}", e))
            })?;

        for result in results {
            match result {
                Ok(topic) => info!("{:<12} --> Kafka 토픽 생성 성공: {}", "Producer", topic),
                Err((topic, code)) => {
                    warn!("{:<12} --> Kafka 토픽 {} 생성 건너뜀: {:?}", "Producer", topic, code)
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for KafkaProducer {
    async fn publish(&self, event: &AuctionEvent) -> Result<()> {
        let payload = serde_json::to_string(event).map_err(|e| Error::Event(e.to_string()))?;
        self.send_message(&event.lot_id().to_string(), &payload).await
    }
}
// endregion: --- Kafka Producer

// endregion: --- Tests
