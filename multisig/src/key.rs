use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use serde::{Deserialize, Serialize};

/// Signing key (aka "privkey") is a type alias for the scalar in the Ristretto255 group.
pub type SigningKey = Scalar;

/// Verification key (aka "pubkey") is a wrapper type around a Ristretto point
/// that lets the verifier check a signature.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug, Serialize, Deserialize)]
#[serde(from = "CompressedRistretto", into = "CompressedRistretto")]
pub struct VerificationKey {
    point: CompressedRistretto,
}

impl VerificationKey {
    /// Constructs a VerificationKey from a private key.
    pub fn from_secret(privkey: &Scalar) -> Self {
        (privkey * RISTRETTO_BASEPOINT_POINT).into()
    }

    /// Creates a key from a compressed point without decompressing it.
    pub fn from_compressed(p: CompressedRistretto) -> Self {
        VerificationKey { point: p }
    }

    /// Converts the verification key to a compressed point.
    pub fn into_point(self) -> CompressedRistretto {
        self.point
    }

    /// Returns a reference to the compressed ristretto point.
    pub fn as_point(&self) -> &CompressedRistretto {
        &self.point
    }

    /// Returns the view into the byte representation of the verification key.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.point.as_bytes()
    }

    /// Returns the byte representation of the verification key.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.point.to_bytes()
    }
}

impl From<RistrettoPoint> for VerificationKey {
    fn from(p: RistrettoPoint) -> Self {
        VerificationKey { point: p.compress() }
    }
}

impl From<CompressedRistretto> for VerificationKey {
    fn from(p: CompressedRistretto) -> Self {
        VerificationKey { point: p }
    }
}

impl From<VerificationKey> for CompressedRistretto {
    fn from(k: VerificationKey) -> Self {
        k.into_point()
    }
}
