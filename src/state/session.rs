/// Identification session: the request lifecycle state machine
///
/// Idle -> Loading on `submit`, Loading -> Identified/Failed on `complete`,
/// anything -> Idle on `reset`. The session never performs the call itself;
/// it hands out a ticketed request and accepts the matching completion.
/// The image itself moves into the request; the app keeps only its preview.

use super::data::{EncodedImage, IdentificationRequest, IdentificationResult};
use crate::error::IdentifyError;

/// Inline message shown for any failed identification
pub const GENERIC_ERROR: &str = "Something went wrong while identifying the species.";

/// Where the session currently stands
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Failed(String),
    Identified(IdentificationResult),
}

/// What a completion did to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Identified,
    Failed,
    /// The ticket no longer matches; the outcome was dropped
    Stale,
}

#[derive(Debug, Default)]
pub struct Session {
    phase: Phase,
    /// Ticket of the most recent request
    ticket: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start identifying a freshly acquired image
    ///
    /// Prior results and errors are cleared before the call resolves.
    pub fn submit(&mut self, image: EncodedImage) -> IdentificationRequest {
        self.ticket += 1;
        self.phase = Phase::Loading;

        IdentificationRequest {
            ticket: self.ticket,
            image,
        }
    }

    /// Apply the outcome of the call issued with `ticket`
    ///
    /// Every failure cause collapses to the same generic message.
    pub fn complete(
        &mut self,
        ticket: u64,
        outcome: Result<IdentificationResult, IdentifyError>,
    ) -> Completion {
        if ticket != self.ticket || self.phase != Phase::Loading {
            log::debug!("Dropping stale identification (ticket {ticket}, current {})", self.ticket);
            return Completion::Stale;
        }

        match outcome {
            Ok(result) => {
                log::info!(
                    "✅ Identified {} ({:.1}% confidence)",
                    result.species_name,
                    result.confidence
                );
                self.phase = Phase::Identified(result);
                Completion::Identified
            }
            Err(e) => {
                log::warn!("⚠️  Identification failed: {e}");
                self.phase = Phase::Failed(GENERIC_ERROR.to_string());
                Completion::Failed
            }
        }
    }

    /// Return to the initial state, discarding result and error
    ///
    /// A call still in flight keeps running; its completion will be stale.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The acquirer is only shown (and only feeds us) while idle
    pub fn accepts_images(&self) -> bool {
        self.phase == Phase::Idle
    }
}
