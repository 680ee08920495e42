use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    config::AppConfig,
    integrations::{
        mailer::{LogMailer, Mailer, SmtpMailer},
        payments::{PaymentGateway, StripeGateway, UnconfiguredGateway},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub mailer: Arc<dyn Mailer>,
    pub payments: Arc<dyn PaymentGateway>,
}

impl AppState {
    /// Wires the production collaborators, falling back to the log mailer and
    /// the unconfigured gateway when credentials are absent.
    pub fn from_config(orm: DatabaseConnection, config: AppConfig) -> anyhow::Result<Self> {
        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp, config.external_timeout)?),
            None => {
                tracing::warn!("SMTP_HOST not set, OTP emails will only be logged");
                Arc::new(LogMailer)
            }
        };

        let payments: Arc<dyn PaymentGateway> = match &config.stripe {
            Some(stripe) => Arc::new(StripeGateway::new(
                stripe.clone(),
                config.external_timeout,
            )?),
            None => {
                tracing::warn!("STRIPE_SECRET_KEY not set, payment intents will fail");
                Arc::new(UnconfiguredGateway)
            }
        };

        Ok(Self {
            orm,
            config: Arc::new(config),
            mailer,
            payments,
        })
    }
}
