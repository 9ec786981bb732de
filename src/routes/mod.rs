pub mod captcha;
pub mod counter;
