use crate::{
    configuration::Settings,
    domain::EmailAddress,
    email_client::EmailClient,
    rate_limit::RateLimiter,
    request_id::{AddRequestIdLayer, MakeSpanWithRequestId, UseRequestId},
    routes,
};

use std::net::{SocketAddr, TcpListener};

use anyhow::Context;
use axum::{extract::Extension, routing, Router};
use http::StatusCode;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer, services::ServeFile, trace::TraceLayer, ServiceBuilderExt,
};
use tracing::Level;

pub struct Application {
    app: Router,
    listener: TcpListener,
}

/// Mailbox that receives contact notifications.
#[derive(Clone, Debug)]
pub struct ContactRecipient(pub EmailAddress);

impl ContactRecipient {
    pub fn address(&self) -> &EmailAddress {
        &self.0
    }
}

impl Application {
    pub fn build(settings: Settings) -> Result<Self, anyhow::Error> {
        let email_client = EmailClient::new(
            &settings.email_client.base_url,
            settings.email_client.sender_email.clone(),
            &settings.email_client.authorization_token,
            settings.email_client.timeout(),
        )
        .context("failed to build the email client")?;

        let recipient = ContactRecipient(settings.email_client.recipient_email.clone());

        let rate_limiter = RateLimiter::new(
            settings.rate_limit.max_requests,
            settings.rate_limit.window(),
        );

        let middleware = ServiceBuilder::new()
            .layer(AddRequestIdLayer)
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(MakeSpanWithRequestId::default().level(Level::INFO))
                    .on_failure(()),
            )
            .set_x_request_id(UseRequestId)
            .propagate_x_request_id()
            .layer(CorsLayer::permissive())
            .layer(Extension(email_client))
            .layer(Extension(recipient))
            .layer(Extension(rate_limiter))
            .into_inner();

        let index = routing::get_service(ServeFile::new(&settings.application.index_file))
            .handle_error(|error: std::io::Error| async move {
                tracing::error!(error = %error, "failed to serve the portfolio page");
                StatusCode::INTERNAL_SERVER_ERROR
            });

        let app = Router::new()
            .route("/", index)
            .route("/api/health", routing::get(routes::health_check::handler))
            .route("/api/contact", routing::post(routes::contact::handler))
            .layer(middleware);

        let address = settings.application.address();
        let listener = TcpListener::bind(&address)
            .with_context(|| format!("failed to bind {}", address))?;

        Ok(Application { app, listener })
    }

    pub async fn run(self) -> Result<(), hyper::Error> {
        if let Ok(address) = self.listener.local_addr() {
            tracing::info!(%address, "backend server is running");
            tracing::info!("contact form endpoint: http://{}/api/contact", address);
            tracing::info!("health check: http://{}/api/health", address);
        }

        hyper::Server::from_tcp(self.listener)?
            .serve(
                self.app
                    .into_make_service_with_connect_info::<SocketAddr, _>(),
            )
            .await
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
