//! TLS connector setup for the hyper transport.
//!
//! # Feature Flags
//!
//! TLS needs both a crypto provider and root certificates:
//!
//! - `tls-ring` or `tls-aws-lc` pick the crypto provider
//! - `tls-native-roots` or `tls-webpki-roots` pick the root store
//!
//! The `tls` feature enables `tls-ring` + `tls-native-roots`. Without a
//! feature-gated provider, a globally installed rustls provider is used.

use std::sync::Arc;

use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use rustls::ClientConfig;

use crate::builder::ClientBuildError;

type VerifierBuilder = rustls::ConfigBuilder<ClientConfig, rustls::WantsVerifier>;

/// Whether both a crypto provider and root certificates are compiled in.
#[inline]
pub const fn has_tls_support() -> bool {
    cfg!(any(feature = "tls-ring", feature = "tls-aws-lc"))
        && cfg!(any(feature = "tls-native-roots", feature = "tls-webpki-roots"))
}

/// Feature-gated provider first, then the global default.
fn crypto_provider_builder() -> Option<VerifierBuilder> {
    #[cfg(feature = "tls-ring")]
    let provider = Some(Arc::new(rustls::crypto::ring::default_provider()));

    #[cfg(all(feature = "tls-aws-lc", not(feature = "tls-ring")))]
    let provider = Some(Arc::new(rustls::crypto::aws_lc_rs::default_provider()));

    #[cfg(not(any(feature = "tls-ring", feature = "tls-aws-lc")))]
    let provider = rustls::crypto::CryptoProvider::get_default().cloned();

    ClientConfig::builder_with_provider(provider?)
        .with_safe_default_protocol_versions()
        .ok()
}

/// Build the default TLS configuration from the enabled features.
///
/// Returns `None` when no crypto provider is available.
#[cfg(any(feature = "tls-native-roots", feature = "tls-webpki-roots"))]
pub fn default_tls_config() -> Option<ClientConfig> {
    let builder = crypto_provider_builder()?;
    Some(builder.with_root_certificates(root_store()).with_no_client_auth())
}

#[cfg(any(feature = "tls-native-roots", feature = "tls-webpki-roots"))]
fn root_store() -> rustls::RootCertStore {
    let mut roots = rustls::RootCertStore::empty();

    // Native roots win when both are enabled.
    #[cfg(feature = "tls-native-roots")]
    {
        let native = rustls_native_certs::load_native_certs();
        if !native.errors.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::debug!(errors = ?native.errors, "errors loading native certs");
        }
        roots.add_parsable_certificates(native.certs);
    }

    #[cfg(all(feature = "tls-webpki-roots", not(feature = "tls-native-roots")))]
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    roots
}

/// Build an HTTPS-or-HTTP connector.
///
/// Without an explicit config, the default one is built from the enabled
/// features; fails when that is impossible.
pub fn build_https_connector(
    tls_config: Option<ClientConfig>,
) -> Result<HttpsConnector<HttpConnector>, ClientBuildError> {
    let config = match tls_config {
        Some(config) => config,
        None => fallback_tls_config()?,
    };

    Ok(HttpsConnectorBuilder::new()
        .with_tls_config(config)
        .https_or_http()
        .enable_all_versions()
        .build())
}

#[cfg(any(feature = "tls-native-roots", feature = "tls-webpki-roots"))]
fn fallback_tls_config() -> Result<ClientConfig, ClientBuildError> {
    default_tls_config().ok_or_else(|| {
        ClientBuildError::Tls(
            "no crypto provider: enable `tls-ring` or `tls-aws-lc`, or install a global rustls provider"
                .to_string(),
        )
    })
}

#[cfg(not(any(feature = "tls-native-roots", feature = "tls-webpki-roots")))]
fn fallback_tls_config() -> Result<ClientConfig, ClientBuildError> {
    Err(ClientBuildError::Tls(
        "no root certificates: enable `tls-native-roots` or `tls-webpki-roots`, or pass a TLS config"
            .to_string(),
    ))
}

/// Accepts any server certificate. Development only.
#[derive(Debug)]
pub struct DangerousAcceptAnyCertVerifier;

impl rustls::client::danger::ServerCertVerifier for DangerousAcceptAnyCertVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        use rustls::SignatureScheme::*;
        vec![
            RSA_PKCS1_SHA256,
            RSA_PKCS1_SHA384,
            RSA_PKCS1_SHA512,
            ECDSA_NISTP256_SHA256,
            ECDSA_NISTP384_SHA384,
            ECDSA_NISTP521_SHA512,
            RSA_PSS_SHA256,
            RSA_PSS_SHA384,
            RSA_PSS_SHA512,
            ED25519,
        ]
    }
}

/// A TLS config that skips certificate verification.
pub fn danger_accept_invalid_certs_config() -> Result<ClientConfig, ClientBuildError> {
    let builder = crypto_provider_builder()
        .ok_or_else(|| ClientBuildError::Tls("no crypto provider available".to_string()))?;
    Ok(builder
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(DangerousAcceptAnyCertVerifier))
        .with_no_client_auth())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(all(
        any(feature = "tls-ring", feature = "tls-aws-lc"),
        any(feature = "tls-native-roots", feature = "tls-webpki-roots")
    ))]
    #[test]
    fn test_default_connector() {
        assert!(has_tls_support());
        assert!(default_tls_config().is_some());
        assert!(build_https_connector(None).is_ok());
    }

    #[cfg(any(feature = "tls-ring", feature = "tls-aws-lc"))]
    #[test]
    fn test_danger_config_builds() {
        let config = danger_accept_invalid_certs_config().unwrap();
        assert!(build_https_connector(Some(config)).is_ok());
    }
}
