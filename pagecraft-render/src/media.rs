use serde::{Deserialize, Serialize};

/// A stored reference to a media item, as it appears in component props.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaRef {
    Url(String),
    Id(i64),
    Object {
        #[serde(default)]
        id: Option<i64>,
        #[serde(default)]
        url: Option<String>,
    },
}

/// Turns media references into URLs the browser can load.
pub trait MediaResolver {
    fn resolve(&self, media: &MediaRef) -> Option<String>;
}

/// Resolves against a public base URL.
///
/// Absolute and `data:` URLs are kept; relative paths are joined onto the base;
/// bare ids map to `<base>/media/<id>`.
#[derive(Debug, Clone, Default)]
pub struct BaseUrlResolver {
    base_url: Option<String>,
}

impl BaseUrlResolver {
    pub fn new(base_url: Option<impl Into<String>>) -> Self {
        Self {
            base_url: base_url.map(Into::into),
        }
    }

    fn join(&self, path: &str) -> String {
        match &self.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            None => path.to_string(),
        }
    }

    fn url_for(&self, url: &str) -> Option<String> {
        if url.is_empty() {
            return None;
        }
        if is_absolute(url) {
            return Some(url.to_string());
        }
        Some(self.join(url))
    }
}

impl MediaResolver for BaseUrlResolver {
    fn resolve(&self, media: &MediaRef) -> Option<String> {
        match media {
            MediaRef::Url(url) => self.url_for(url),
            MediaRef::Id(id) => Some(self.join(&format!("/media/{}", id))),
            MediaRef::Object { url: Some(url), .. } if !url.is_empty() => self.url_for(url),
            MediaRef::Object { id: Some(id), .. } => Some(self.join(&format!("/media/{}", id))),
            MediaRef::Object { .. } => None,
        }
    }
}

fn is_absolute(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("//")
        || lower.starts_with("data:image/")
}

/// Drops URLs with a script scheme; everything else is returned as is.
///
/// Browsers ignore tabs, newlines and leading control characters when reading
/// a scheme, so those are skipped before comparing.
pub(crate) fn safe_url(url: &str) -> Option<&str> {
    let scheme: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    if scheme.starts_with("javascript:") || scheme.starts_with("vbscript:") {
        None
    } else {
        Some(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_relative_paths() {
        let resolver = BaseUrlResolver::new(Some("https://cdn.example.com/"));
        assert_eq!(
            resolver.resolve(&MediaRef::Url("/uploads/a.png".into())),
            Some("https://cdn.example.com/uploads/a.png".into())
        );
    }

    #[test]
    fn keeps_absolute_urls() {
        let resolver = BaseUrlResolver::new(Some("https://cdn.example.com"));
        let url = "https://images.example.org/b.jpg";
        assert_eq!(resolver.resolve(&MediaRef::Url(url.into())), Some(url.into()));
    }

    #[test]
    fn maps_ids() {
        let resolver = BaseUrlResolver::new(Some("https://site.test"));
        assert_eq!(
            resolver.resolve(&MediaRef::Id(42)),
            Some("https://site.test/media/42".into())
        );
        let obj = MediaRef::Object { id: Some(7), url: None };
        assert_eq!(resolver.resolve(&obj), Some("https://site.test/media/7".into()));
    }

    #[test]
    fn without_base_paths_pass_through() {
        let resolver = BaseUrlResolver::default();
        assert_eq!(
            resolver.resolve(&MediaRef::Url("img/logo.svg".into())),
            Some("img/logo.svg".into())
        );
        assert_eq!(resolver.resolve(&MediaRef::Url(String::new())), None);
    }

    #[test]
    fn deserializes_every_shape() {
        let refs: Vec<MediaRef> =
            serde_json::from_str(r#"["/a.png", 3, {"id": 4}, {"url": "/b.png"}]"#).unwrap();
        assert_eq!(refs[0], MediaRef::Url("/a.png".into()));
        assert_eq!(refs[1], MediaRef::Id(3));
        assert_eq!(refs[2], MediaRef::Object { id: Some(4), url: None });
    }

    #[test]
    fn rejects_script_urls() {
        assert_eq!(safe_url("JavaScript:alert(1)"), None);
        assert_eq!(safe_url(" java\tscript:alert(1)"), None);
        assert_eq!(safe_url("VBScript:x"), None);
        assert_eq!(safe_url("/ok"), Some("/ok"));
    }
}
