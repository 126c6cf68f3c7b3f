use serde::{Deserialize, Deserializer};

/// A deserializer for the url::Url type. Does not support deserializing a list,
/// only a single URL.
pub fn url_deserializer_single<'de, D>(deserializer: D) -> Result<url::Url, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer)?
        .parse()
        .map_err(serde::de::Error::custom)
}

/// A deserializer for the std::time::Duration type.
/// Serde includes a default deserializer, but it expects a struct.
pub fn duration_seconds_deserializer<'de, D>(
    deserializer: D,
) -> Result<std::time::Duration, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(std::time::Duration::from_secs(
        u64::deserialize(deserializer).map_err(serde::de::Error::custom)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Endpoint {
        #[serde(deserialize_with = "url_deserializer_single")]
        url: url::Url,
        #[serde(deserialize_with = "duration_seconds_deserializer")]
        timeout: std::time::Duration,
    }

    #[test]
    fn deserializes_url_and_duration() {
        let endpoint: Endpoint =
            serde_json::from_str(r#"{"url": "http://localhost:8080", "timeout": 30}"#).unwrap();
        assert_eq!(endpoint.url.as_str(), "http://localhost:8080/");
        assert_eq!(endpoint.timeout, std::time::Duration::from_secs(30));
    }

    #[test]
    fn rejects_unparseable_url() {
        let result = serde_json::from_str::<Endpoint>(r#"{"url": "not a url", "timeout": 1}"#);
        assert!(result.is_err());
    }
}
