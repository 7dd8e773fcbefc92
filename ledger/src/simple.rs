//! A deliberately small ledger for tests and simulations: outputs are
//! tagged integers annotated with a value, and a transaction simply names
//! the references it consumes and the outputs it creates.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::{Ledger, LedgerError, OutputProfile, UtxoSet};

/// Output of the simple ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleOutput {
    /// Value held by the output.
    pub value: u64,
    /// Marks the output as using a legacy address form.
    pub legacy_address: bool,
    /// Marks the output as carrying a reference script.
    pub reference_script: bool,
}

impl SimpleOutput {
    /// Plain output with a value and no unusual features.
    pub fn new(value: u64) -> Self {
        SimpleOutput {
            value,
            legacy_address: false,
            reference_script: false,
        }
    }

    /// Output locked by a legacy address.
    pub fn legacy(value: u64) -> Self {
        SimpleOutput {
            value,
            legacy_address: true,
            reference_script: false,
        }
    }

    /// Output carrying a reference script.
    pub fn with_reference_script(value: u64) -> Self {
        SimpleOutput {
            value,
            legacy_address: false,
            reference_script: true,
        }
    }
}

/// UTxO set of the simple ledger: tagged integers mapped to outputs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleUtxo {
    outputs: BTreeMap<u64, SimpleOutput>,
}

impl SimpleUtxo {
    /// An empty set.
    pub fn new() -> Self {
        SimpleUtxo::default()
    }

    /// Set holding a single output.
    pub fn singleton(reference: u64, output: SimpleOutput) -> Self {
        let mut outputs = BTreeMap::new();
        outputs.insert(reference, output);
        SimpleUtxo { outputs }
    }

    /// Set holding the given references, each with a unit value.
    pub fn from_references(references: impl IntoIterator<Item = u64>) -> Self {
        SimpleUtxo {
            outputs: references
                .into_iter()
                .map(|r| (r, SimpleOutput::new(1)))
                .collect(),
        }
    }

    /// Adds an output, replacing any previous one under the same reference.
    pub fn insert(&mut self, reference: u64, output: SimpleOutput) {
        self.outputs.insert(reference, output);
    }

    /// Whether the set contains the given reference.
    pub fn contains(&self, reference: u64) -> bool {
        self.outputs.contains_key(&reference)
    }

    /// References in the set, in ascending order.
    pub fn references(&self) -> impl Iterator<Item = u64> + '_ {
        self.outputs.keys().copied()
    }

    /// Number of outputs in the set.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl UtxoSet for SimpleUtxo {
    fn union(&self, other: &Self) -> Self {
        let mut outputs = self.outputs.clone();
        for (reference, output) in other.outputs.iter() {
            outputs.insert(*reference, *output);
        }
        SimpleUtxo { outputs }
    }

    fn contains_all(&self, other: &Self) -> bool {
        other
            .outputs
            .iter()
            .all(|(reference, output)| self.outputs.get(reference) == Some(output))
    }

    fn total_value(&self) -> u64 {
        self.outputs.values().map(|o| o.value).sum()
    }

    fn output_profiles(&self) -> Vec<OutputProfile> {
        self.outputs
            .values()
            .map(|o| OutputProfile {
                value: o.value,
                legacy_address: o.legacy_address,
                reference_script: o.reference_script,
            })
            .collect()
    }
}

/// Transaction of the simple ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleTx {
    /// Stable identifier.
    pub id: u64,
    /// References consumed by the transaction.
    pub inputs: BTreeSet<u64>,
    /// Outputs created by the transaction.
    pub outputs: BTreeMap<u64, SimpleOutput>,
}

impl SimpleTx {
    /// Transaction consuming `inputs` and creating unit-value `outputs`.
    pub fn new(
        id: u64,
        inputs: impl IntoIterator<Item = u64>,
        outputs: impl IntoIterator<Item = u64>,
    ) -> Self {
        SimpleTx {
            id,
            inputs: inputs.into_iter().collect(),
            outputs: outputs
                .into_iter()
                .map(|r| (r, SimpleOutput::new(1)))
                .collect(),
        }
    }
}

/// The simple ledger itself. Stateless; all state lives in the UTxO set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimpleLedger;

impl Ledger for SimpleLedger {
    type Tx = SimpleTx;
    type TxId = u64;
    type Utxo = SimpleUtxo;

    fn tx_id(tx: &SimpleTx) -> u64 {
        tx.id
    }

    fn empty_utxo(&self) -> SimpleUtxo {
        SimpleUtxo::new()
    }

    fn apply(&self, utxo: &SimpleUtxo, tx: &SimpleTx) -> Result<SimpleUtxo, LedgerError> {
        let mut next = utxo.clone();
        for input in tx.inputs.iter() {
            if next.outputs.remove(input).is_none() {
                return Err(LedgerError::MissingInput(*input));
            }
        }
        for (reference, output) in tx.outputs.iter() {
            if next.outputs.contains_key(reference) {
                return Err(LedgerError::DuplicateOutput(*reference));
            }
            next.outputs.insert(*reference, *output);
        }
        Ok(next)
    }
}
