pub mod mock;
pub mod razorpay;
pub mod webhook;

pub use mock::MockGateway;
pub use razorpay::RazorpayGateway;
pub use webhook::WebhookVerifier;
