// src/notify/smtp.rs
use std::time::Duration;

use chrono::{Local, NaiveDate};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{Message, SmtpTransport, Transport};

use super::{Digest, Notifier};
use crate::config::options::{parse_address, Credentials, SmtpSettings};
use crate::error::{Result, WatchError};
use crate::log::Diagnostics;
use crate::record::Dataset;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated SMTP over TLS. The sender is the credential user.
pub struct SmtpNotifier {
    settings: SmtpSettings,
    credentials: Credentials,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Fails with a configuration error if the credential user is not an address.
    pub fn new(settings: SmtpSettings, credentials: Credentials) -> Result<Self> {
        let from = Mailbox::new(None, parse_address(&credentials.user)?);
        Ok(Self { settings, credentials, from })
    }

    /// One multipart (plain + HTML) message addressed to all recipients.
    pub fn build_message(
        &self,
        recipients: &[String],
        subject: &str,
        records: &Dataset,
        update_date: NaiveDate,
    ) -> Result<Message> {
        if recipients.is_empty() {
            return Err(WatchError::Delivery(s!("no recipients")));
        }
        let mut builder = Message::builder().from(self.from.clone()).subject(subject);
        for r in recipients {
            let addr = parse_address(r).map_err(|e| WatchError::Delivery(e.to_string()))?;
            builder = builder.to(Mailbox::new(None, addr));
        }

        let digest = Digest::build(records, update_date);
        builder
            .multipart(MultiPart::alternative_plain_html(digest.plain, digest.html))
            .map_err(|e| WatchError::Delivery(format!("could not build message: {e}")))
    }

    fn transport(&self) -> Result<SmtpTransport> {
        let host = self.settings.host.as_str();
        let builder = if self.settings.implicit_tls() {
            SmtpTransport::relay(host)
        } else {
            SmtpTransport::starttls_relay(host)
        }
        .map_err(|e| WatchError::Delivery(format!("SMTP setup for {host} failed: {e}")))?;

        Ok(builder
            .port(self.settings.port)
            .credentials(SmtpCredentials::new(
                self.credentials.user.clone(),
                self.credentials.password().to_owned(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build())
    }
}

impl Notifier for SmtpNotifier {
    fn notify(
        &self,
        recipients: &[String],
        subject: &str,
        records: &Dataset,
        diag: &dyn Diagnostics,
    ) -> Result<()> {
        let message = self.build_message(recipients, subject, records, Local::now().date_naive())?;
        let transport = self.transport()?;
        transport.send(&message).map_err(|e| {
            WatchError::Delivery(format!(
                "{}:{} rejected or unreachable: {e}",
                self.settings.host, self.settings.port
            ))
        })?;
        diag.debug(&format!(
            "sent {subject:?} via {}:{} to {} recipient(s)",
            self.settings.host,
            self.settings.port,
            recipients.len()
        ));
        Ok(())
    }
}
