use unicode_segmentation::UnicodeSegmentation;

pub const MAX_INTEREST_LENGTH: usize = 50;

/// A sanitized interest tag: lowercase letters, digits, spaces and hyphens only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Interest(String);

impl Interest {
    pub fn parse(raw: &str) -> Result<Interest, String> {
        let cleaned: String = raw
            .to_lowercase()
            .chars()
            .map(|char| if char.is_whitespace() { ' ' } else { char })
            .filter(|char| {
                char.is_ascii_lowercase() || char.is_ascii_digit() || *char == ' ' || *char == '-'
            })
            .collect();
        let truncated: String = cleaned
            .trim()
            .graphemes(true)
            .take(MAX_INTEREST_LENGTH)
            .collect();
        let interest = truncated.trim_end();

        if interest.is_empty() {
            return Err(format!("{} is not a valid interest", raw));
        }

        Ok(Self(interest.to_string()))
    }
}

impl AsRef<str> for Interest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
