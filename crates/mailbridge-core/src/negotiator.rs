//! Substitution table agreement.
//!
//! Two agents that share a secret derive the same table independently, so the
//! table itself never travels. The request/accept exchange only agrees on an
//! identifier; carrying it between peers is left to the caller.

use crate::codec::{STANDARD_ALPHABET, SubstitutionTable};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Derives the table agreed on through a shared secret.
///
/// The seed is the sum of the secret's character codes, so the same secret
/// always yields the same table.
#[must_use]
pub fn derive_table(shared_secret: &str) -> SubstitutionTable {
    let seed: u64 = shared_secret.chars().map(u64::from).sum();
    generate_table(Some(seed))
}

/// Shuffles the standard alphabet, reproducibly when a seed is given.
#[must_use]
pub fn generate_table(seed: Option<u64>) -> SubstitutionTable {
    let mut chars: Vec<char> = STANDARD_ALPHABET.chars().collect();
    shuffle(&mut chars, seed);
    from_permutation(chars)
}

/// Reshuffles an existing table's characters with the given seed.
#[must_use]
pub fn rotate_table(current: &SubstitutionTable, rotation_seed: u64) -> SubstitutionTable {
    let mut chars = current.chars().to_vec();
    shuffle(&mut chars, Some(rotation_seed));
    from_permutation(chars)
}

fn shuffle(chars: &mut [char], seed: Option<u64>) {
    match seed {
        Some(seed) => chars.shuffle(&mut StdRng::seed_from_u64(seed)),
        None => chars.shuffle(&mut rand::thread_rng()),
    }
}

fn from_permutation(chars: Vec<char>) -> SubstitutionTable {
    // A permutation of a valid table is valid.
    SubstitutionTable::from_chars(chars).unwrap_or_default()
}

/// Negotiation request sent from the initiating agent to its peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationRequest {
    /// `<sender_id>_<four digits>`.
    pub negotiation_id: String,
    /// Identifier of the initiating agent.
    pub sender_id: String,
}

#[derive(Debug, Clone)]
struct Pending {
    sender_id: String,
    table: SubstitutionTable,
}

/// Tracks negotiations started by this agent.
#[derive(Debug, Default)]
pub struct Negotiator {
    pending: HashMap<String, Pending>,
}

impl Negotiator {
    /// Creates a negotiator with no pending negotiations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a negotiation, remembering the table derived from the secret.
    pub fn create_request(&mut self, sender_id: &str, shared_secret: &str) -> NegotiationRequest {
        let table = derive_table(shared_secret);
        let negotiation_id = format!(
            "{sender_id}_{}",
            rand::thread_rng().gen_range(1000..=9999)
        );

        tracing::debug!(%negotiation_id, "Created negotiation request");
        self.pending.insert(
            negotiation_id.clone(),
            Pending {
                sender_id: sender_id.to_string(),
                table,
            },
        );

        NegotiationRequest {
            negotiation_id,
            sender_id: sender_id.to_string(),
        }
    }

    /// Accepts a peer's request, deriving the table from our copy of the secret.
    #[must_use]
    pub fn accept(
        &self,
        request: &NegotiationRequest,
        shared_secret: &str,
    ) -> (String, SubstitutionTable) {
        tracing::debug!(
            negotiation_id = %request.negotiation_id,
            sender_id = %request.sender_id,
            "Accepted negotiation request"
        );
        (request.negotiation_id.clone(), derive_table(shared_secret))
    }

    /// Checks a peer's table against the one stored for the negotiation.
    ///
    /// Returns false for unknown negotiation ids.
    #[must_use]
    pub fn confirm(&self, negotiation_id: &str, table: &SubstitutionTable) -> bool {
        self.pending
            .get(negotiation_id)
            .is_some_and(|pending| &pending.table == table)
    }

    /// Sender of a pending negotiation.
    #[must_use]
    pub fn sender_of(&self, negotiation_id: &str) -> Option<&str> {
        self.pending
            .get(negotiation_id)
            .map(|pending| pending.sender_id.as_str())
    }

    /// Forgets a negotiation, returning its table.
    pub fn complete(&mut self, negotiation_id: &str) -> Option<SubstitutionTable> {
        self.pending.remove(negotiation_id).map(|pending| pending.table)
    }
}
