//! Dataset loading.
//!
//! Users are supplied wholesale as a JSON or YAML document holding a list of
//! users with their stories.

use std::path::Path;

use stories_core::error::StoryError;
use stories_core::model::User;
use tracing::info;

/// Serialization format of a dataset document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    /// JSON.
    Json,
    /// YAML.
    Yaml,
}

impl DatasetFormat {
    /// Infers the format from a file extension. Anything but `.json` is
    /// read as YAML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|extension| extension.to_str()) {
            Some(extension) if extension.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Parses a dataset document.
///
/// # Errors
///
/// Returns `StoryError::Dataset` if the document does not parse, and
/// `StoryError::NoPlayableStories` if no user has a story.
pub fn parse_dataset(source: &str, format: DatasetFormat) -> Result<Vec<User>, StoryError> {
    let users: Vec<User> = match format {
        DatasetFormat::Json => {
            serde_json::from_str(source).map_err(|e| StoryError::Dataset(e.to_string()))?
        }
        DatasetFormat::Yaml => {
            serde_yaml::from_str(source).map_err(|e| StoryError::Dataset(e.to_string()))?
        }
    };
    if !users.iter().any(User::is_navigable) {
        return Err(StoryError::NoPlayableStories);
    }
    Ok(users)
}

/// Reads and parses the dataset at `path`.
///
/// # Errors
///
/// Returns `StoryError::Dataset` if the file cannot be read or parsed, and
/// `StoryError::NoPlayableStories` if no user has a story.
pub async fn load_dataset(path: &Path) -> Result<Vec<User>, StoryError> {
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StoryError::Dataset(format!("{}: {e}", path.display())))?;
    let users = parse_dataset(&source, DatasetFormat::from_path(path))?;
    info!(
        path = %path.display(),
        users = users.len(),
        stories = users.iter().map(|user| user.stories.len()).sum::<usize>(),
        "dataset loaded"
    );
    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_dataset() {
        // Arrange
        let json = r#"[
            {
                "id": "u1",
                "username": "alice",
                "avatarUrl": "https://cdn.test/alice.png",
                "stories": [
                    { "id": "s1", "type": "image", "src": "https://cdn.test/s1.jpg" },
                    { "id": "s2", "type": "video", "src": "https://cdn.test/s2.mp4" }
                ]
            }
        ]"#;

        // Act
        let users = parse_dataset(json, DatasetFormat::Json).unwrap();

        // Assert
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].stories.len(), 2);
        assert!(users[0].stories[1].discovers_duration());
    }

    #[test]
    fn test_dataset_without_stories_is_rejected() {
        let yaml = "- id: u1\n  handle: alice\n  avatar_url: a.png\n  stories: []\n";

        let result = parse_dataset(yaml, DatasetFormat::Yaml);

        assert_eq!(result.unwrap_err(), StoryError::NoPlayableStories);
    }

    #[test]
    fn test_malformed_dataset_reports_dataset_error() {
        let result = parse_dataset("{ not json", DatasetFormat::Json);

        assert!(matches!(result, Err(StoryError::Dataset(_))));
    }

    #[test]
    fn test_format_is_inferred_from_extension() {
        assert_eq!(
            DatasetFormat::from_path(Path::new("stories.JSON")),
            DatasetFormat::Json
        );
        assert_eq!(
            DatasetFormat::from_path(Path::new("stories.yaml")),
            DatasetFormat::Yaml
        );
    }
}
