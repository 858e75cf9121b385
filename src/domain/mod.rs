pub mod article;
pub mod interest;
pub mod new_subscriber;
pub mod subscriber;
pub mod subscriber_email;
pub mod subscriber_interests;
pub mod subscriber_timezone;
