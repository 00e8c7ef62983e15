//! Discussion phase configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Built-in discussion topics, used when the config does not list its own.
pub const DEFAULT_TOPICS: &[&str] = &[
    "Impact of remote learning on education",
    "AI in modern education systems",
    "Climate change and sustainable solutions",
    "The future of work and automation",
    "Social media's impact on mental health",
    "Importance of soft skills in careers",
    "Ethics of artificial intelligence",
    "Digital privacy in the modern age",
];

/// Settings for the preparation/discussion cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscussionConfig {
    /// Length of the preparation countdown before discussion starts.
    pub prep_duration_secs: u64,
    /// Pool of topics; one is picked uniformly at random per cycle.
    pub topics: Vec<String>,
    /// Starter name announced in `prep-start` when neither the request nor
    /// the caller's room membership supplies one.
    pub default_display_name: String,
}

impl Default for DiscussionConfig {
    fn default() -> Self {
        Self {
            prep_duration_secs: 40,
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
            default_display_name: "Anonymous".into(),
        }
    }
}

impl DiscussionConfig {
    pub fn prep_duration(&self) -> Duration {
        Duration::from_secs(self.prep_duration_secs)
    }
}
