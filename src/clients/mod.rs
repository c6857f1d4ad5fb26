pub mod face;
pub mod mailer;
