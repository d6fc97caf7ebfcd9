/// The base URL of the deployed front-end which resolves shared report links.
pub const DEFAULT_FRONT_BASE_URL: &str = "https://anthonyx82.ddns.net/taller-front";

/// The pieces of a share invocation: a title, an accompanying text and the
/// public URL of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareMessage {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl ShareMessage {
    /// Builds the standard share message for a report token. The URL format is
    /// the one the service itself mails out for a freshly created report.
    pub fn for_report(front_base_url: &str, token: &str) -> ShareMessage {
        ShareMessage {
            title: "Informe del Vehiculo".to_string(),
            text: "Consulta el informe de tu vehiculo:".to_string(),
            url: format!("{}/informe/{}", front_base_url.trim_end_matches('/'), token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_share_url_matches_the_mailed_link_format() {
        let message = ShareMessage::for_report(DEFAULT_FRONT_BASE_URL, "abc123");
        assert_eq!(
            message.url,
            "https://anthonyx82.ddns.net/taller-front/informe/abc123"
        );
    }

    #[test]
    fn a_trailing_slash_does_not_double_up() {
        let message = ShareMessage::for_report("https://example.test/front/", "abc123");
        assert_eq!(message.url, "https://example.test/front/informe/abc123");
    }
}
