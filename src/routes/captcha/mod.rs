mod handler;
mod model;

pub use handler::verify_captcha;
pub use model::{CaptchaRequest, CaptchaResponse};
