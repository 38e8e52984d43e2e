pub mod error;
pub mod gateway;
pub mod mock;
pub mod stripe;
pub mod webhook;

pub use error::PaymentError;
pub use gateway::{
    CardDetails, CheckoutParams, CheckoutSession, PaymentGateway, PaymentIntent,
    PaymentIntentParams, PaymentIntentStatus,
};
pub use stripe::{classify_secret_key, KeyMode, StripeGateway};
