//! HTTP response wrapper.

use super::FetchError;

/// Fully buffered response to a GET.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub url: String,
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`FetchError::Status`].
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Status {
                status: self.status,
                url: self.url,
            })
        }
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> FetchResponse {
        FetchResponse {
            url: "https://shop.test/p/1".to_string(),
            status,
            body: b"<p>ok</p>".to_vec(),
        }
    }

    #[test]
    fn test_error_for_status() {
        assert!(response(200).error_for_status().is_ok());
        match response(404).error_for_status() {
            Err(FetchError::Status { status, url }) => {
                assert_eq!(status, 404);
                assert_eq!(url, "https://shop.test/p/1");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_text() {
        assert_eq!(response(200).text(), "<p>ok</p>");
    }
}
