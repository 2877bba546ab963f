// Upstream collaborators the frontend calls through narrow interfaces
pub mod auth_service;
pub mod payment_service;

pub use auth_service::{
    ApiAuthService, AuthError, AuthService, LoginInput, RegistrationInput, TotpVerificationInput,
};
pub use payment_service::{ApiPaymentManager, CheckoutSession, PaymentError, PaymentManager};
