use crate::domain::interest::Interest;

pub const MAX_INTERESTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SubscriberInterests(Vec<Interest>);

impl SubscriberInterests {
    /// Sanitizes every tag and keeps the first ten distinct ones. Tags that
    /// sanitize to nothing are dropped rather than rejected.
    pub fn parse(raw_interests: Vec<String>) -> Result<SubscriberInterests, String> {
        let mut interests: Vec<Interest> = Vec::new();

        for interest in raw_interests.iter().filter_map(|raw| Interest::parse(raw).ok()) {
            if interests.len() == MAX_INTERESTS {
                break;
            }
            if !interests.contains(&interest) {
                interests.push(interest);
            }
        }

        if interests.is_empty() {
            return Err(String::from("At least one valid interest is required"));
        }

        Ok(Self(interests))
    }

    pub fn as_strings(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|interest| interest.as_ref().to_string())
            .collect()
    }
}

impl AsRef<[Interest]> for SubscriberInterests {
    fn as_ref(&self) -> &[Interest] {
        &self.0
    }
}
