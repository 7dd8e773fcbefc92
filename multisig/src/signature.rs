use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::scalar::Scalar;
use merlin::Transcript;
use serde::{de::Deserializer, de::Visitor, ser::Serializer, Deserialize, Serialize};

use super::errors::MultisigError;
use super::key::VerificationKey;
use super::transcript::TranscriptProtocol;

/// A Schnorr signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Signature scalar combining nonce, challenge and private key.
    pub s: Scalar,
    /// Nonce commitment.
    pub R: CompressedRistretto,
}

impl Signature {
    /// Creates a signature over a transcript with a single private key.
    /// The message must have already been fed into the transcript.
    pub fn sign(transcript: &mut Transcript, privkey: Scalar) -> Signature {
        let X = VerificationKey::from_secret(&privkey);

        let mut rng = transcript
            .build_rng()
            .rekey_with_witness_bytes(b"x", privkey.as_bytes())
            .finalize(&mut rand::thread_rng());

        // Generate ephemeral keypair (r, R). r is a random nonce.
        let r = Scalar::random(&mut rng);
        let R = (RISTRETTO_BASEPOINT_POINT * r).compress();

        let c = {
            transcript.headsig_domain_sep();
            transcript.append_point(b"X", X.as_point());
            transcript.append_point(b"R", &R);
            transcript.challenge_scalar(b"c")
        };

        let s = r + c * privkey;

        Signature { s, R }
    }

    /// Verifies the signature over a transcript using the provided verification key.
    /// The transcript must be in the same state as it was during the `sign` call
    /// that created the signature.
    pub fn verify(
        &self,
        transcript: &mut Transcript,
        pubkey: VerificationKey,
    ) -> Result<(), MultisigError> {
        // Make c = H(pubkey, R, m); the message has already been fed in.
        let c = {
            transcript.headsig_domain_sep();
            transcript.append_point(b"X", pubkey.as_point());
            transcript.append_point(b"R", &self.R);
            transcript.challenge_scalar(b"c")
        };

        let X = pubkey
            .into_point()
            .decompress()
            .ok_or(MultisigError::InvalidPoint)?;
        let R = self.R.decompress().ok_or(MultisigError::InvalidPoint)?;

        // s * G == R + c * X
        if RISTRETTO_BASEPOINT_POINT * self.s == R + X * c {
            Ok(())
        } else {
            Err(MultisigError::InvalidSignature)
        }
    }

    /// Signs a message with a given domain-separation label.
    /// Byte-oriented convenience over the transcript API.
    pub fn sign_message(label: &'static [u8], message: &[u8], privkey: Scalar) -> Signature {
        Self::sign(&mut Self::transcript_for_message(label, message), privkey)
    }

    /// Verifies a signature over a labelled message.
    pub fn verify_message(
        &self,
        label: &'static [u8],
        message: &[u8],
        pubkey: VerificationKey,
    ) -> Result<(), MultisigError> {
        self.verify(&mut Self::transcript_for_message(label, message), pubkey)
    }

    fn transcript_for_message(label: &'static [u8], message: &[u8]) -> Transcript {
        let mut t = Transcript::new(b"Headsig.sign_message");
        t.append_message(label, message);
        t
    }
}

impl Signature {
    /// Decodes a signature from a 64-byte slice.
    pub fn from_bytes(sig: &[u8]) -> Result<Self, MultisigError> {
        if sig.len() != 64 {
            return Err(MultisigError::InvalidSignature);
        }
        let mut Rbuf = [0u8; 32];
        let mut sbuf = [0u8; 32];
        Rbuf[..].copy_from_slice(&sig[..32]);
        sbuf[..].copy_from_slice(&sig[32..]);
        Ok(Signature {
            R: CompressedRistretto(Rbuf),
            s: Scalar::from_canonical_bytes(sbuf).ok_or(MultisigError::InvalidSignature)?,
        })
    }

    /// Encodes the signature as a 64-byte array.
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(self.R.as_bytes());
        buf[32..].copy_from_slice(self.s.as_bytes());
        buf
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.to_bytes()[..])
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SigVisitor;

        impl<'de> Visitor<'de> for SigVisitor {
            type Value = Signature;

            fn expecting(&self, formatter: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
                formatter.write_str("a valid schnorr signature")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Signature, E>
            where
                E: serde::de::Error,
            {
                Signature::from_bytes(v).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_bytes(SigVisitor)
    }
}
