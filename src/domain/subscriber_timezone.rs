use chrono_tz::Tz;

pub const DEFAULT_TIMEZONE: &str = "America/New_York";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberTimezone(Tz);

impl SubscriberTimezone {
    /// A missing or blank timezone falls back to `America/New_York`.
    pub fn parse(timezone: Option<String>) -> Result<SubscriberTimezone, String> {
        let timezone = timezone
            .map(|timezone| timezone.trim().to_string())
            .filter(|timezone| !timezone.is_empty())
            .unwrap_or_else(|| String::from(DEFAULT_TIMEZONE));

        match timezone.parse::<Tz>() {
            Ok(tz) => Ok(Self(tz)),
            Err(_) => Err(format!("{} is not a supported timezone", timezone)),
        }
    }

    pub fn tz(&self) -> Tz {
        self.0
    }
}

impl AsRef<str> for SubscriberTimezone {
    fn as_ref(&self) -> &str {
        self.0.name()
    }
}
