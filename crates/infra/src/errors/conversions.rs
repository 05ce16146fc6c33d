//! Conversions from external infrastructure errors into domain errors.

use lingua_domain::LinguaError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub LinguaError);

impl From<InfraError> for LinguaError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<LinguaError> for InfraError {
    fn from(value: LinguaError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoLinguaError {
    fn into_lingua(self) -> LinguaError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → LinguaError */
/* -------------------------------------------------------------------------- */

impl IntoLinguaError for HttpError {
    fn into_lingua(self) -> LinguaError {
        if self.is_timeout() {
            return LinguaError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return LinguaError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return LinguaError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        LinguaError::Network(format!("HTTP transport failure: {self}"))
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_lingua())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::Client;

    use super::*;

    #[tokio::test]
    async fn malformed_url_maps_to_invalid_input() {
        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get("http://[::1").send().await.unwrap_err();

        let mapped: LinguaError = InfraError::from(error).into();
        match mapped {
            LinguaError::InvalidInput(msg) => assert!(msg.contains("invalid HTTP request")),
            other => panic!("expected invalid input, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn refused_connection_maps_to_network() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let mapped: LinguaError = InfraError::from(error).into();
        assert!(matches!(mapped, LinguaError::Network(_)));
    }
}
