pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod flight_repo;
pub mod payment_repo;
pub mod refund_repo;
pub mod user_repo;

pub use app_config::Config;
pub use booking_repo::BookingRepository;
pub use database::DbClient;
pub use flight_repo::FlightRepository;
pub use payment_repo::PaymentRepository;
pub use refund_repo::RefundRepository;
pub use user_repo::UserRepository;
