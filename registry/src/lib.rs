use std::sync::Arc;

use adapter::redis::RedisClient;
use adapter::repository::{
    auth::AuthRepositoryImpl, booking::BookingRepositoryImpl,
    conversation::ConversationRepositoryImpl, health::HealthCheckRepositoryImpl,
    order::OrderRepositoryImpl, payment::PaymentRepositoryImpl,
};
use adapter::database::ConnectionPool;
use kernel::repository::{
    auth::AuthRepository, booking::BookingRepository, conversation::ConversationRepository,
    health::HealthCheckRepository, order::OrderRepository, payment::PaymentRepository,
};
use shared::config::{AppConfig, BookingConfig, SchedulerConfig};

#[derive(Clone)]
pub struct AppRegistry {
    health_check_repository: Arc<dyn HealthCheckRepository>,
    auth_repository: Arc<dyn AuthRepository>,
    booking_repository: Arc<dyn BookingRepository>,
    conversation_repository: Arc<dyn ConversationRepository>,
    payment_repository: Arc<dyn PaymentRepository>,
    order_repository: Arc<dyn OrderRepository>,
    booking_config: BookingConfig,
    scheduler_config: SchedulerConfig,
}

impl AppRegistry {
    pub fn new(pool: ConnectionPool, redis_client: Arc<RedisClient>, app_config: &AppConfig) -> Self {
        let health_check_repository = Arc::new(HealthCheckRepositoryImpl::new(pool.clone()));
        let auth_repository = Arc::new(AuthRepositoryImpl::new(pool.clone(), redis_client));
        let booking_repository = Arc::new(BookingRepositoryImpl::new(pool.clone()));
        let conversation_repository = Arc::new(ConversationRepositoryImpl::new(pool.clone()));
        let payment_repository = Arc::new(PaymentRepositoryImpl::new(pool.clone()));
        let order_repository = Arc::new(OrderRepositoryImpl::new(pool));
        Self {
            health_check_repository,
            auth_repository,
            booking_repository,
            conversation_repository,
            payment_repository,
            order_repository,
            booking_config: app_config.booking,
            scheduler_config: app_config.scheduler,
        }
    }

    pub fn health_check_repository(&self) -> Arc<dyn HealthCheckRepository> {
        self.health_check_repository.clone()
    }

    pub fn auth_repository(&self) -> Arc<dyn AuthRepository> {
        self.auth_repository.clone()
    }

    pub fn booking_repository(&self) -> Arc<dyn BookingRepository> {
        self.booking_repository.clone()
    }

    pub fn conversation_repository(&self) -> Arc<dyn ConversationRepository> {
        self.conversation_repository.clone()
    }

    pub fn payment_repository(&self) -> Arc<dyn PaymentRepository> {
        self.payment_repository.clone()
    }

    pub fn order_repository(&self) -> Arc<dyn OrderRepository> {
        self.order_repository.clone()
    }

    pub fn booking_config(&self) -> BookingConfig {
        self.booking_config
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        self.scheduler_config
    }
}
