//! Synthetic references for demos and tests.
//!
//! Compiled only with the `simulated` feature (and in unit tests). Every
//! reference produced here is flagged `synthetic`.

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;

use crate::blockchain::aptos::is_transaction_hash as is_primary_hash;
use crate::blockchain::backend::NetworkBackend;
use crate::blockchain::stellar::is_transaction_hash as is_secondary_hash;
use crate::blockchain::types::{
    AnchorReference, AnchorStatus, ChainResult, NetworkId, RecordKind,
};
use crate::blockchain::wallet::WalletAdapter;

/// A random, correctly shaped transaction id for `network`.
pub fn random_reference_id(network: NetworkId) -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    match network {
        NetworkId::Primary => format!("0x{}", hex::encode(bytes)),
        NetworkId::Secondary => hex::encode(bytes),
    }
}

/// A committed-looking reference with plausible height and cost.
pub fn synthesize_reference(
    network: NetworkId,
    id: Option<&str>,
    submitter: &str,
    kind: Option<RecordKind>,
) -> AnchorReference {
    let mut rng = rand::thread_rng();
    AnchorReference {
        id: id.map(str::to_string).unwrap_or_else(|| random_reference_id(network)),
        network,
        submitter: submitter.to_string(),
        submitted_at: Utc::now(),
        status: AnchorStatus::Success,
        block_height: Some(rng.gen_range(100_000..1_100_000)),
        cost: Some(rng.gen_range(100..1_100)),
        kind,
        synthetic: true,
    }
}

/// Backend that never touches a chain.
pub struct SimulatedBackend {
    network: NetworkId,
}

impl SimulatedBackend {
    pub fn new(network: NetworkId) -> Self {
        Self { network }
    }
}

#[async_trait]
impl NetworkBackend for SimulatedBackend {
    fn network(&self) -> NetworkId {
        self.network
    }

    fn is_well_formed(&self, reference: &str) -> bool {
        match self.network {
            NetworkId::Primary => is_primary_hash(reference),
            NetworkId::Secondary => is_secondary_hash(reference),
        }
    }

    async fn submit_record(
        &self,
        _wallet: &dyn WalletAdapter,
        submitter: &str,
        _content: &[u8],
        kind: RecordKind,
    ) -> ChainResult<AnchorReference> {
        Ok(synthesize_reference(self.network, None, submitter, Some(kind)))
    }

    async fn lookup(&self, reference: &str) -> ChainResult<AnchorReference> {
        Ok(synthesize_reference(self.network, Some(reference), "", None))
    }
}
