//! `serve`: run the JSON-RPC server until EOF or Ctrl-C.

use crate::CliOutput;
use crate::error::CliError;
use crate::telemetry::init_tracing;
use hybrid_rag_config::{TransportKind, ValidatedRuntimeConfig};
use hybrid_rag_infra::{
    InfraResult, RpcHandler, build_logger, http, load_effective_config, serve_stdio, start_engine,
};
use hybrid_rag_shared::{CancellationToken, CorrelationId, ErrorEnvelope, RequestContext};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Inputs for the serve command; flags win over config and env.
pub struct ServeCommandInput<'a> {
    pub config_path: Option<&'a Path>,
    pub transport: Option<TransportKind>,
    pub host: Option<&'a str>,
    pub port: Option<u16>,
}

/// Serve until the transport ends, then shut the engine down.
pub async fn run_serve(
    env: &BTreeMap<String, String>,
    input: &ServeCommandInput<'_>,
) -> Result<CliOutput, CliError> {
    let config = apply_flags(load_effective_config(env, input.config_path, None)?, input)?;
    init_tracing(config.server.log_level, config.server.log_format);

    let shutdown = CancellationToken::new();
    watch_interrupt(shutdown.clone());

    let logger = build_logger(&config);
    let ctx = RequestContext::with_cancellation(CorrelationId::new_request_id(), shutdown.clone());
    let engine = start_engine(&ctx, &config, Arc::clone(&logger)).await?;
    let handler = RpcHandler::new(Arc::clone(&engine)).with_logger(logger);

    let served = serve(&config, handler, shutdown.clone()).await;
    shutdown.cancel();
    engine.shutdown().await;
    served?;
    Ok(CliOutput::default())
}

async fn serve(
    config: &ValidatedRuntimeConfig,
    handler: RpcHandler,
    shutdown: CancellationToken,
) -> InfraResult<()> {
    match config.server.transport {
        TransportKind::Stdio => {
            let exit = serve_stdio(&handler, shutdown).await?;
            tracing::info!(?exit, "stdio transport stopped");
            Ok(())
        },
        TransportKind::Http => {
            let listener = http::bind(&config.server.host, config.server.port).await?;
            http::serve_http(listener, handler, shutdown).await
        },
    }
}

fn apply_flags(
    config: ValidatedRuntimeConfig,
    input: &ServeCommandInput<'_>,
) -> Result<ValidatedRuntimeConfig, CliError> {
    if input.transport.is_none() && input.host.is_none() && input.port.is_none() {
        return Ok(config);
    }
    let mut raw = config.into_inner();
    if let Some(transport) = input.transport {
        raw.server.transport = transport;
    }
    if let Some(host) = input.host {
        raw.server.host = host.into();
    }
    if let Some(port) = input.port {
        raw.server.port = port;
    }
    Ok(raw.validate_and_normalize().map_err(ErrorEnvelope::from)?)
}

fn watch_interrupt(shutdown: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            shutdown.cancel();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_rag_config::RuntimeConfig;

    #[test]
    fn flags_override_loaded_config() -> Result<(), CliError> {
        let config = RuntimeConfig::default()
            .validate_and_normalize()
            .map_err(ErrorEnvelope::from)?;
        let input = ServeCommandInput {
            config_path: None,
            transport: Some(TransportKind::Http),
            host: Some("127.0.0.1"),
            port: Some(9090),
        };

        let config = apply_flags(config, &input)?;
        assert_eq!(config.server.transport, TransportKind::Http);
        assert_eq!(config.server.host.as_ref(), "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        Ok(())
    }

    #[test]
    fn blank_host_flag_is_rejected() -> Result<(), CliError> {
        let config = RuntimeConfig::default()
            .validate_and_normalize()
            .map_err(ErrorEnvelope::from)?;
        let input = ServeCommandInput {
            config_path: None,
            transport: None,
            host: Some("  "),
            port: None,
        };
        assert!(apply_flags(config, &input).is_err());
        Ok(())
    }
}
