use regex::Regex;
use url::Url;

use crate::error::IngestError;

/// Pulls video ids out of watch URLs, short links, or any URL carrying an 11-character id
/// after `v=` or a slash.
#[derive(Debug, Clone)]
pub struct VideoIdExtractor {
    embedded: Regex,
}

impl VideoIdExtractor {
    pub fn new() -> Result<Self, IngestError> {
        Ok(Self {
            embedded: Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})")?,
        })
    }

    pub fn extract(&self, input: &str) -> Result<String, IngestError> {
        if let Some(id) = from_known_host(input) {
            return Ok(id);
        }
        self.embedded
            .captures(input)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| IngestError::InvalidVideoUrl(input.to_string()))
    }
}

fn from_known_host(input: &str) -> Option<String> {
    let url = Url::parse(input).ok()?;
    let id = match url.host_str()? {
        "youtube.com" | "www.youtube.com" | "m.youtube.com" if url.path() == "/watch" => url
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, id)| id.into_owned())?,
        "youtu.be" => url.path().trim_start_matches('/').to_string(),
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> VideoIdExtractor {
        VideoIdExtractor::new().unwrap()
    }

    #[test]
    fn watch_and_short_links() {
        let ids = extractor();
        assert_eq!(
            ids.extract("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(ids.extract("https://youtu.be/dQw4w9WgXcQ").unwrap(), "dQw4w9WgXcQ");
    }

    #[test]
    fn embedded_id_fallback() {
        assert_eq!(
            extractor()
                .extract("https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0")
                .unwrap(),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn rejects_urls_without_id() {
        let ids = extractor();
        assert!(matches!(
            ids.extract("https://example.com/"),
            Err(IngestError::InvalidVideoUrl(_))
        ));
        assert!(ids.extract("").is_err());
    }

    #[test]
    fn one_extractor_serves_many_urls() {
        let ids = extractor();
        let urls = [
            "https://www.youtube.com/watch?v=O6DTtVOPwEU&ab_channel=VIJAYFOCUS",
            "https://youtu.be/O6DTtVOPwEU",
            "https://www.youtube.com/shorts/O6DTtVOPwEU",
        ];
        for url in urls {
            assert_eq!(ids.extract(url).unwrap(), "O6DTtVOPwEU", "{url}");
        }
    }
}
