use actix_web::web;
use serde::Deserialize;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_interests::SubscriberInterests;
use crate::domain::subscriber_timezone::SubscriberTimezone;

#[derive(Debug, Clone)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub interests: SubscriberInterests,
    pub timezone: SubscriberTimezone,
}

#[derive(Deserialize, Debug)]
pub struct NewSubscriberBody {
    pub email: String,
    pub interests: Vec<String>,
    pub timezone: Option<String>,
}

impl TryFrom<web::Json<NewSubscriberBody>> for NewSubscriber {
    type Error = String;

    fn try_from(body: web::Json<NewSubscriberBody>) -> Result<Self, Self::Error> {
        let body = body.into_inner();
        let email = SubscriberEmail::parse(body.email)?;
        let interests = SubscriberInterests::parse(body.interests)?;
        let timezone = SubscriberTimezone::parse(body.timezone)?;

        Ok(NewSubscriber {
            email,
            interests,
            timezone,
        })
    }
}
