//! Command handlers for CLI subcommands

use std::path::Path;
use std::sync::Arc;

use pinnet_core::http::{Method, Request};
use pinnet_core::{
    CertificateStore, DirectoryBundle, ErrorWithCode, RequestClient, ServerError,
    StaticTokenProvider, TokenExchange,
};
use serde::Serialize;
use tracing::instrument;

use crate::cli::{CertsArgs, ErrorHashArgs, FetchArgs, OutputFormat};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::redaction;
use crate::output::OutputWriter;

/// Handle the fetch command
#[instrument(skip_all, fields(url = %args.url, method = %args.method))]
pub async fn handle_fetch(args: FetchArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let store = load_store(args.certs_dir.as_deref())?;
    let client = RequestClient::with_store(config.client.clone(), store)?;

    let body = fetch(client, &args, config).await?;
    write_body(&args, body, output)
}

/// Send the request described by `args` over `client`, authorizing it when a scope is set
pub async fn fetch(client: RequestClient, args: &FetchArgs, config: &Config) -> Result<Vec<u8>> {
    let request = build_request(args)?;

    let scope = args.scope.clone().or_else(|| config.token_exchange.scope.clone());
    let Some(scope) = scope else {
        return Ok(client.make_request(request).await?);
    };

    let token = args.bearer_token.clone().ok_or_else(|| {
        Error::invalid_args("--scope requires --bearer-token or PINNET_BEARER_TOKEN")
    })?;
    let tokens = Arc::new(StaticTokenProvider::new(token));

    let exchange_endpoint = match &args.token_exchange {
        Some(endpoint) => Some(endpoint.clone()),
        None => config.token_exchange.endpoint_url()?,
    };

    let client = match exchange_endpoint {
        Some(endpoint) => {
            tracing::info!(endpoint = %endpoint, scope = %scope, "Authorizing through token exchange");
            client.with_token_exchange(TokenExchange::new(endpoint, tokens))
        }
        None => {
            tracing::info!(scope = %scope, "Authorizing with bearer token");
            client.with_authorization_provider(tokens)
        }
    };

    Ok(client.make_authorized_request(&scope, request).await?)
}

fn build_request(args: &FetchArgs) -> Result<Request> {
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .map_err(|_| Error::invalid_args(format!("Invalid HTTP method '{}'", args.method)))?;

    let mut request = Request::new(method, args.url.clone());
    if let Some(data) = &args.data {
        *request.body_mut() = Some(data.clone().into());
    }
    Ok(request)
}

fn write_body(args: &FetchArgs, body: Vec<u8>, output: &mut OutputWriter) -> Result<()> {
    if let Some(path) = &args.save_to {
        std::fs::write(path, &body)?;
        return output.success(&format!("Saved {} bytes to {}", body.len(), path.display()));
    }

    let json = serde_json::from_slice::<serde_json::Value>(&body).ok();
    match json {
        Some(mut value) if args.redact || output.format() != OutputFormat::Human => {
            if args.redact {
                redaction::redact_json_value(&mut value);
            }
            output.write_value(&value)
        }
        _ => {
            output.write_bytes(&body)?;
            if !body.ends_with(b"\n") && output.format() == OutputFormat::Human {
                output.writeln("")?;
            }
            Ok(())
        }
    }
}

fn load_store(dir: Option<&Path>) -> Result<CertificateStore> {
    let store = match dir {
        Some(dir) => {
            if !dir.is_dir() {
                return Err(Error::FileNotFound {
                    path: dir.to_path_buf(),
                });
            }
            CertificateStore::load(&DirectoryBundle::new(dir))?
        }
        None => CertificateStore::embedded()?,
    };
    Ok(store)
}

#[derive(Debug, Serialize)]
struct CertificateReport {
    name: &'static str,
    checksum: String,
    size: usize,
}

/// Handle the certs command
pub fn handle_certs(args: CertsArgs, output: &mut OutputWriter) -> Result<()> {
    let source = args
        .dir
        .as_ref()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|| "bundled certificates".to_string());
    output.info(&format!("Verifying {}", source))?;

    let store = load_store(args.dir.as_deref())?;
    let report: Vec<CertificateReport> = store
        .iter()
        .zip(store.checksums())
        .map(|(certificate, (name, checksum))| CertificateReport {
            name,
            checksum,
            size: certificate.der().len(),
        })
        .collect();

    if output.format() == OutputFormat::Human {
        for certificate in &report {
            output.success(&format!(
                "{:<18} {} ({} bytes)",
                certificate.name, certificate.checksum, certificate.size
            ))?;
        }
        output.info(&format!("{} pinned certificates verified", report.len()))
    } else {
        output.write_value(&report)
    }
}

/// Handle the error-hash command
pub fn handle_error_hash(args: ErrorHashArgs, output: &mut OutputWriter) -> Result<()> {
    let error = ServerError::new(args.endpoint, args.code);
    tracing::debug!(code = error.error_code(), has_hash = error.hash().is_some(), "Computed error parameters");
    output.write_value(&error.parameters())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::cli::Commands;
    use clap::Parser;
    use pinnet_core::testing::MockTransport;
    use pinnet_core::HttpResponse;

    fn fetch_args(argv: &[&str]) -> FetchArgs {
        let mut full = vec!["pinnet", "fetch"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Fetch(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    fn client(transport: &MockTransport) -> RequestClient {
        RequestClient::with_transport(Arc::new(transport.clone()))
    }

    #[test]
    fn test_build_request() {
        let args = fetch_args(&["https://api.example.com/v1/orders", "-X", "post", "-d", "{}"]);
        let request = build_request(&args).unwrap();
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.body().and_then(|b| b.as_bytes()), Some(&b"{}"[..]));

        let args = fetch_args(&["https://api.example.com", "-X", "BAD METHOD"]);
        assert!(matches!(build_request(&args), Err(Error::InvalidArgs(_))));
    }

    #[tokio::test]
    async fn test_fetch_without_scope_is_unauthorized() {
        let transport = MockTransport::new();
        transport.respond_with(200, "ok");
        let args = fetch_args(&["https://api.example.com/v1/status", "--bearer-token", "T"]);

        let body = fetch(client(&transport), &args, &Config::default()).await.unwrap();
        assert_eq!(body, b"ok");
        assert!(transport.requests()[0].header("authorization").is_none());
    }

    #[tokio::test]
    async fn test_fetch_with_scope_uses_bearer_token() {
        let transport = MockTransport::new();
        transport.respond_with(200, "ok");
        let args = fetch_args(&[
            "https://api.example.com/v1/me",
            "--scope",
            "read:me",
            "--bearer-token",
            "T",
        ]);

        fetch(client(&transport), &args, &Config::default()).await.unwrap();
        assert_eq!(transport.requests()[0].header("authorization"), Some("Bearer T"));
    }

    #[tokio::test]
    async fn test_fetch_with_exchange_from_config() {
        let transport = MockTransport::new();
        transport.respond_with_handler(|request| {
            let body = if request.path() == "/oauth2/token" {
                r#"{"access_token":"A","token_type":"bearer","expires_in":60}"#
            } else {
                "ok"
            };
            Ok(HttpResponse::new(200, request.url.clone(), body))
        });

        let mut config = Config::default();
        config.token_exchange.endpoint = Some("https://auth.example.com/oauth2/token".to_string());
        config.token_exchange.scope = Some("read:orders".to_string());
        let args = fetch_args(&["https://api.example.com/v1/orders", "--bearer-token", "subject"]);

        fetch(client(&transport), &args, &config).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0]
            .form_pairs()
            .contains(&("scope".to_string(), "read:orders".to_string())));
        assert_eq!(requests[1].header("authorization"), Some("Bearer A"));
    }

    #[tokio::test]
    async fn test_fetch_with_scope_requires_token() {
        let transport = MockTransport::new();
        let mut args = fetch_args(&["https://api.example.com/v1/me", "--scope", "read:me"]);
        args.bearer_token = None;

        let error = fetch(client(&transport), &args, &Config::default()).await.unwrap_err();
        assert!(matches!(error, Error::InvalidArgs(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_server_error_surfaces() {
        let transport = MockTransport::new();
        transport.respond_with(404, "");
        let args = fetch_args(&["https://api.example.com/v1/users"]);

        let error = fetch(client(&transport), &args, &Config::default()).await.unwrap_err();
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_load_store_from_missing_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("absent");
        assert!(matches!(load_store(Some(&missing)), Err(Error::FileNotFound { .. })));

        let error = load_store(Some(dir.path())).unwrap_err();
        assert_eq!(error.exit_code(), 5);
    }
}
