pub mod turnstile;

pub use turnstile::{CaptchaPolicy, CaptchaVerifier, TurnstileVerifier, VerifyOutcome};
