use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    config::SmtpConfig,
    domain::{Booking, Profile, Provider},
    error::{AppError, Result},
};

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| AppError::Email(format!("SMTP relay setup failed: {e}")))?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = config
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| AppError::Email(format!("Invalid from address: {e}")))?;

        Ok(Self { transport: builder.build(), from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(email
                .to
                .parse::<Mailbox>()
                .map_err(|e| AppError::Email(format!("Invalid recipient {}: {e}", email.to)))?)
            .subject(email.subject)
            .body(email.body)
            .map_err(|e| AppError::Email(format!("Failed to build message: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Email(format!("SMTP send failed: {e}")))?;

        Ok(())
    }
}

/// Stand-in when SMTP is not configured: deliveries are dropped with a log
/// line instead of failing.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        tracing::debug!(recipient = %email.to, subject = %email.subject, "email delivery disabled, dropping message");
        Ok(())
    }
}

/// Booking and payment notifications to both parties. Every send is
/// best-effort: a failure is logged and never propagated, so email outages
/// cannot fail booking creation or webhook processing.
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    pub async fn booking_created(
        &self,
        consumer: &Profile,
        provider: &Provider,
        booking: &Booking,
        listing_title: &str,
    ) {
        let summary = order_summary(booking, listing_title);

        self.try_send(OutgoingEmail {
            to: consumer.email.clone(),
            subject: format!("Booking received: {listing_title}"),
            body: format!(
                "Hi {},\n\nYour booking is in. We'll let you know when {} accepts.\n\n{}",
                consumer.full_name, provider.display_name, summary
            ),
        })
        .await;

        self.try_send(OutgoingEmail {
            to: provider.contact_email.clone(),
            subject: format!("New booking request: {listing_title}"),
            body: format!(
                "A new booking is waiting for your acceptance.\n\n{summary}"
            ),
        })
        .await;
    }

    pub async fn payment_confirmed(
        &self,
        consumer: &Profile,
        provider: &Provider,
        booking: &Booking,
        listing_title: &str,
    ) {
        let summary = order_summary(booking, listing_title);

        self.try_send(OutgoingEmail {
            to: consumer.email.clone(),
            subject: format!("Payment confirmed: {listing_title}"),
            body: format!(
                "Hi {},\n\nYour payment went through.\n\n{}",
                consumer.full_name, summary
            ),
        })
        .await;

        self.try_send(OutgoingEmail {
            to: provider.contact_email.clone(),
            subject: format!("Booking paid: {listing_title}"),
            body: format!("The consumer's payment cleared.\n\n{summary}"),
        })
        .await;
    }

    async fn try_send(&self, email: OutgoingEmail) {
        let to = email.to.clone();
        if let Err(e) = self.mailer.send(email).await {
            tracing::error!(recipient = %to, error = ?e, "notification email failed");
        }
    }
}

fn order_summary(booking: &Booking, listing_title: &str) -> String {
    format!(
        "Order {}\nService: {}\nScheduled: {}\nDropoff: {}\nTotal: ${:.2}",
        booking.id,
        listing_title,
        booking.scheduled_at.to_rfc3339(),
        booking.dropoff_address,
        booking.total_price
    )
}

#[cfg(any(test, feature = "test-utils"))]
pub use recording::RecordingMailer;

#[cfg(any(test, feature = "test-utils"))]
mod recording {
    use std::sync::Mutex;

    use super::*;

    /// Captures every outgoing email so tests can assert on send counts and
    /// recipients.
    #[derive(Default)]
    pub struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    impl RecordingMailer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> Vec<OutgoingEmail> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: OutgoingEmail) -> Result<()> {
            self.sent.lock().unwrap().push(email);
            Ok(())
        }
    }
}
