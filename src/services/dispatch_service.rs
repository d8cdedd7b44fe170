//! services/dispatch_service.rs
//! Orquestador de envío: por cada contacto, un ciclo de reintentos acotado
//! alrededor de un único envío, registrando cada intento en el log.
//!
//! Estados por contacto:
//! PENDING -> SKIPPED | SENDING; SENDING -> SENT | SENDING (reintento) | ABORTED.

use std::time::Duration;

use crate::{
    error::MailerError,
    models::{
        contact_model::{AttemptLedger, AttemptRecord, Contact},
        email_model::SentMessage,
        log_model::{DeliveryStatus, LogEntry},
    },
    services::{compose_service::ComposeService, email_service::MailTransport, run_log_service::RunLog},
};

/// Estado terminal de un contacto en la corrida.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    Sent,
    Aborted,
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub sent: usize,
    /// Intentos fallidos (no contactos)
    pub failed: usize,
    pub aborted: usize,
    pub skipped: usize,
}

pub struct DispatchService<'a, T: MailTransport + ?Sized> {
    composer: &'a ComposeService,
    transport: &'a T,
    max_retries: u32,
    send_delay: Duration,
}

impl<'a, T: MailTransport + ?Sized> DispatchService<'a, T> {
    pub fn new(
        composer: &'a ComposeService,
        transport: &'a T,
        max_retries: u32,
        send_delay: Duration,
    ) -> Self {
        Self {
            composer,
            transport,
            max_retries,
            send_delay,
        }
    }

    /// Procesa todos los contactos en orden. Solo los errores al escribir el
    /// log salen de aquí; los de cada intento quedan registrados en él.
    pub async fn run(
        &self,
        contacts: &[Contact],
        ledger: &AttemptLedger,
        log: &mut RunLog,
    ) -> Result<RunStats, MailerError> {
        let mut stats = RunStats::default();

        for contact in contacts {
            let record = ledger.get(&contact.email);
            match self.process_contact(contact, &record, log, &mut stats).await? {
                ContactOutcome::Sent => stats.sent += 1,
                ContactOutcome::Aborted => stats.aborted += 1,
                ContactOutcome::Skipped => stats.skipped += 1,
            }
        }

        Ok(stats)
    }

    async fn process_contact(
        &self,
        contact: &Contact,
        record: &AttemptRecord,
        log: &mut RunLog,
        stats: &mut RunStats,
    ) -> Result<ContactOutcome, MailerError> {
        let run_id = log.run_id().to_string();
        let subject = self.composer.subject_for(contact);

        if record.previous_attempts >= self.max_retries {
            log.append(
                LogEntry::new(&run_id, record.previous_attempts, contact, DeliveryStatus::SkippedMaxRetries)
                    .with_subject(subject)
                    .with_error(record.last_error.clone()),
            )?;
            log::info!(
                "SKIP {} por {} intentos previos",
                contact.email,
                record.previous_attempts
            );
            return Ok(ContactOutcome::Skipped);
        }

        // previous_attempts < max_retries => al menos un intento
        let mut attempt = record.previous_attempts + 1;
        loop {
            match self.send_one(contact).await {
                Ok(sent) => {
                    log.append(
                        LogEntry::new(&run_id, attempt, contact, DeliveryStatus::Sent)
                            .with_subject(subject)
                            .with_attachments(sent.attachment_names.join(", "))
                            .with_message_id(sent.message_id.clone()),
                    )?;
                    log::info!("OK {} [{}] intento {}", contact.email, sent.message_id, attempt);
                    tokio::time::sleep(self.send_delay).await;
                    return Ok(ContactOutcome::Sent);
                }
                Err(e) => {
                    stats.failed += 1;
                    let error = e.to_string();
                    log.append(
                        LogEntry::new(&run_id, attempt, contact, DeliveryStatus::Failed)
                            .with_subject(subject.clone())
                            .with_error(error.clone()),
                    )?;
                    log::warn!("FAIL intento {}: {} -> {}", attempt, contact.email, error);

                    if attempt >= self.max_retries {
                        log.append(
                            LogEntry::new(&run_id, attempt, contact, DeliveryStatus::AbortedMaxRetries)
                                .with_subject(subject)
                                .with_error(error),
                        )?;
                        log::error!("ABORT {} tras {} intentos fallidos", contact.email, attempt);
                        return Ok(ContactOutcome::Aborted);
                    }

                    tokio::time::sleep(self.send_delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Un intento: renderizar, armar y entregar. Todo fallo vuelve como
    /// error, sin distinguir su origen.
    pub async fn send_one(&self, contact: &Contact) -> Result<SentMessage, MailerError> {
        let composed = self.composer.compose(contact).await?;
        let message_id = self.transport.send(&composed.email).await?;
        Ok(SentMessage {
            message_id,
            attachment_names: composed.attachment_names,
        })
    }
}
