//! Built-in keyword classifier.
//!
//! A deliberately simple [`ClassificationAdapter`] for deployments without an
//! external content-safety service: it scans the media title against two
//! configured term lists. Reject terms win over flag terms; a title matching
//! neither is `clean`.

use warden_core::{
  classify::{ClassificationAdapter, ClassificationOutcome, Verdict},
  media::MediaItem,
};

pub struct KeywordClassifier {
  flag_terms:   Vec<String>,
  reject_terms: Vec<String>,
}

impl KeywordClassifier {
  pub fn new(flag_terms: Vec<String>, reject_terms: Vec<String>) -> Self {
    let lower = |terms: Vec<String>| {
      terms.into_iter().map(|t| t.to_lowercase()).collect()
    };
    Self {
      flag_terms:   lower(flag_terms),
      reject_terms: lower(reject_terms),
    }
  }

  fn matches<'a>(title: &str, terms: &'a [String]) -> Vec<&'a str> {
    terms
      .iter()
      .filter(|t| title.contains(t.as_str()))
      .map(String::as_str)
      .collect()
  }
}

impl ClassificationAdapter for KeywordClassifier {
  async fn classify(
    &self,
    media: &MediaItem,
  ) -> Result<ClassificationOutcome, Box<dyn std::error::Error + Send + Sync>>
  {
    let title = media.title.to_lowercase();

    let rejected = Self::matches(&title, &self.reject_terms);
    if !rejected.is_empty() {
      return Ok(ClassificationOutcome {
        verdict:    Verdict::Rejected,
        flags:      rejected.iter().map(|t| t.to_string()).collect(),
        transcript: None,
      });
    }

    let flagged = Self::matches(&title, &self.flag_terms);
    if !flagged.is_empty() {
      return Ok(ClassificationOutcome {
        verdict:    Verdict::Flagged,
        flags:      flagged.iter().map(|t| t.to_string()).collect(),
        transcript: None,
      });
    }

    Ok(ClassificationOutcome {
      verdict:    Verdict::Clean,
      flags:      vec![],
      transcript: None,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  fn media(title: &str) -> MediaItem {
    MediaItem {
      media_id:   Uuid::new_v4(),
      owner_id:   "owner-1".into(),
      title:      title.into(),
      created_at: Utc::now(),
    }
  }

  fn classifier() -> KeywordClassifier {
    KeywordClassifier::new(
      vec!["Gossip".into()],
      vec!["slur".into()],
    )
  }

  #[tokio::test]
  async fn unmatched_title_is_clean() {
    let outcome =
      classifier().classify(&media("Morning Sermon")).await.unwrap();
    assert_eq!(outcome.verdict, Verdict::Clean);
    assert!(outcome.flags.is_empty());
  }

  #[tokio::test]
  async fn flag_terms_match_case_insensitively() {
    let outcome =
      classifier().classify(&media("GOSSIP hour")).await.unwrap();
    assert_eq!(outcome.verdict, Verdict::Flagged);
    assert_eq!(outcome.flags, ["gossip"]);
  }

  #[tokio::test]
  async fn reject_terms_win_over_flag_terms() {
    let outcome =
      classifier().classify(&media("gossip and slur")).await.unwrap();
    assert_eq!(outcome.verdict, Verdict::Rejected);
    assert_eq!(outcome.flags, ["slur"]);
  }
}
