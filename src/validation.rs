use std::collections::HashSet;
use thiserror::Error;

use crate::models::GenerateAllRequest;

/// Input rejected before any network call is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no topics to submit: every line was blank")]
    EmptyTopicList,
    #[error("batch_size must be at least 1")]
    ZeroBatchSize,
    #[error("too many topics in one submission: {count} (limit {max})")]
    TooManyTopics { count: usize, max: usize },
    #[error("topic id must be positive, got {0}")]
    InvalidTopicId(i64),
    #[error("job id must not be blank")]
    BlankJobId,
    #[error("at least one target platform is required")]
    NoTargets,
    #[error("target platform at position {0} is blank")]
    BlankTarget(usize),
    #[error("target platform '{0}' is listed more than once")]
    DuplicateTarget(String),
    #[error("length_hint must be positive")]
    ZeroLengthHint,
}

/// Split pasted text into topic titles, one per non-blank line
pub fn parse_topic_lines(text: &str) -> Vec<String> {
    clean_titles(text.lines())
}

/// Trim titles and drop the blank ones, preserving order
pub fn clean_titles<I, S>(titles: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    titles
        .into_iter()
        .map(|title| title.as_ref().trim().to_string())
        .filter(|title| !title.is_empty())
        .collect()
}

pub fn validate_topic_batch(
    titles: &[String],
    batch_size: usize,
    max_topics: usize,
) -> Result<(), ValidationError> {
    if titles.is_empty() {
        return Err(ValidationError::EmptyTopicList);
    }

    if batch_size == 0 {
        return Err(ValidationError::ZeroBatchSize);
    }

    if titles.len() > max_topics {
        return Err(ValidationError::TooManyTopics {
            count: titles.len(),
            max: max_topics,
        });
    }

    Ok(())
}

pub fn validate_topic_id(topic_id: i64) -> Result<(), ValidationError> {
    if topic_id <= 0 {
        return Err(ValidationError::InvalidTopicId(topic_id));
    }
    Ok(())
}

pub fn validate_job_id(job_id: &str) -> Result<(), ValidationError> {
    if job_id.trim().is_empty() {
        return Err(ValidationError::BlankJobId);
    }
    Ok(())
}

pub fn validate_generate_request(request: &GenerateAllRequest) -> Result<(), ValidationError> {
    validate_topic_id(request.topic_id)?;

    if request.target_platforms.is_empty() {
        return Err(ValidationError::NoTargets);
    }

    let mut seen = HashSet::new();
    for (position, target) in request.target_platforms.iter().enumerate() {
        let target = target.trim();
        if target.is_empty() {
            return Err(ValidationError::BlankTarget(position));
        }
        if !seen.insert(target) {
            return Err(ValidationError::DuplicateTarget(target.to_string()));
        }
    }

    if request.options.length_hint == Some(0) {
        return Err(ValidationError::ZeroLengthHint);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenerationOptions;

    fn request(targets: &[&str]) -> GenerateAllRequest {
        GenerateAllRequest::builder()
            .topic_id(3)
            .target_platforms(targets.iter().map(|t| t.to_string()).collect())
            .build()
    }

    #[test]
    fn parse_topic_lines_drops_blank_lines() {
        let titles = parse_topic_lines("Design a rate limiter\n\n   \n  Design a URL shortener  \r\n");
        assert_eq!(titles, vec!["Design a rate limiter", "Design a URL shortener"]);
    }

    #[test]
    fn empty_batch_rejected() {
        let titles = clean_titles(["  ", ""]);
        assert_eq!(
            validate_topic_batch(&titles, 3, 100),
            Err(ValidationError::EmptyTopicList)
        );
    }

    #[test]
    fn batch_limits() {
        let titles = clean_titles(["a", "b", "c"]);
        assert!(validate_topic_batch(&titles, 3, 100).is_ok());
        assert_eq!(validate_topic_batch(&titles, 0, 100), Err(ValidationError::ZeroBatchSize));
        assert_eq!(
            validate_topic_batch(&titles, 1, 2),
            Err(ValidationError::TooManyTopics { count: 3, max: 2 })
        );
    }

    #[test]
    fn generate_request_accepts_valid_targets() {
        assert!(validate_generate_request(&request(&["instagram-story", "linkedin-post"])).is_ok());
    }

    #[test]
    fn generate_request_rejects_bad_targets() {
        assert_eq!(validate_generate_request(&request(&[])), Err(ValidationError::NoTargets));
        assert_eq!(
            validate_generate_request(&request(&["instagram-story", " "])),
            Err(ValidationError::BlankTarget(1))
        );
        assert_eq!(
            validate_generate_request(&request(&["instagram-story", "instagram-story "])),
            Err(ValidationError::DuplicateTarget("instagram-story".to_string()))
        );
    }

    #[test]
    fn generate_request_rejects_bad_topic_and_hint() {
        let mut req = request(&["instagram-story"]);
        req.topic_id = 0;
        assert_eq!(validate_generate_request(&req), Err(ValidationError::InvalidTopicId(0)));

        let mut req = request(&["instagram-story"]);
        req.options = GenerationOptions::builder().length_hint(0).build();
        assert_eq!(validate_generate_request(&req), Err(ValidationError::ZeroLengthHint));
    }

    #[test]
    fn blank_job_id_rejected() {
        assert_eq!(validate_job_id("  "), Err(ValidationError::BlankJobId));
        assert!(validate_job_id("job-1").is_ok());
    }
}
