//! Service object bundling parameters, an optional master key and a pool of
//! random generators for use from concurrent workers.
use std::sync::Arc;
#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};
use tracing::debug;
use crate::utils::random::RngBank;
use super::*;

/// Scheme configuration.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Waters08Config {
    pub security_bits: u32,
    pub rng_pool_size: usize,
}

impl Default for Waters08Config {
    fn default() -> Self {
        Waters08Config {
            security_bits: MAX_SECURITY_BITS,
            rng_pool_size: 4,
        }
    }
}

/// Waters08 engine. Without a master key it can register attributes,
/// encrypt and decrypt; key generation additionally needs the master key.
pub struct Waters08Scheme {
    params: Arc<Waters08PublicParameters>,
    master_key: Option<Waters08MasterKey>,
    rngs: RngBank,
}

impl Waters08Scheme {
    /// Runs setup and keeps the master key.
    pub fn initialize(config: &Waters08Config) -> Result<Waters08Scheme> {
        let rngs = RngBank::new(config.rng_pool_size);
        let (params, master_key) = {
            let mut rng = rngs.next_rng();
            setup(config.security_bits, &mut *rng)?
        };
        debug!(pool = rngs.len(), "initialized waters08 scheme");
        Ok(Waters08Scheme {
            params: Arc::new(params),
            master_key: Some(master_key),
            rngs,
        })
    }

    /// Wraps existing parameters, e.g. on a decrypting party.
    pub fn from_public_parameters(params: Arc<Waters08PublicParameters>, config: &Waters08Config) -> Waters08Scheme {
        Waters08Scheme {
            params,
            master_key: None,
            rngs: RngBank::new(config.rng_pool_size),
        }
    }

    /// Installs a master key after checking it against the parameters.
    pub fn with_master_key(mut self, master_key: Waters08MasterKey) -> Result<Waters08Scheme> {
        verify_master_key(&self.params, &master_key)?;
        self.master_key = Some(master_key);
        Ok(self)
    }

    pub fn public_parameters(&self) -> &Arc<Waters08PublicParameters> {
        &self.params
    }

    pub fn master_key(&self) -> Option<&Waters08MasterKey> {
        self.master_key.as_ref()
    }

    pub fn register_attribute(&self, name: &str) -> Result<u32> {
        self.params.register_attribute(name, &mut *self.rngs.next_rng())
    }

    pub fn compile(&self, policy: &AccessPolicy) -> Result<ShareGeneratingMatrix> {
        self.params.compile_policy(policy)
    }

    fn require_master_key(&self) -> Result<&Waters08MasterKey> {
        self.master_key
            .as_ref()
            .ok_or_else(|| AbeError::InvalidMasterSecretKey("no master key installed".to_string()))
    }

    pub fn generate_private_key(&self, attributes: &[&str]) -> Result<Waters08PrivateKey> {
        let msk = self.require_master_key()?;
        keygen(&self.params, msk, attributes, &mut *self.rngs.next_rng())
    }

    pub fn generate_private_key_from_ids(&self, ids: &[u32]) -> Result<Waters08PrivateKey> {
        let msk = self.require_master_key()?;
        keygen_from_ids(&self.params, msk, ids, &mut *self.rngs.next_rng())
    }

    pub fn compute_auxiliary(&self, matrix: &ShareGeneratingMatrix) -> Result<(Waters08AuxiliaryCiphertext, Multiplier)> {
        compute_auxiliary(&self.params, matrix, &mut *self.rngs.next_rng())
    }

    pub fn encrypt(&self, matrix: &ShareGeneratingMatrix, plaintext: &[u8]) -> Result<Waters08Ciphertext> {
        encrypt(&self.params, matrix, plaintext, &mut *self.rngs.next_rng())
    }

    pub fn compute_multiplier(&self, aux: &Waters08AuxiliaryCiphertext, sk: &Waters08PrivateKey) -> Result<Multiplier> {
        compute_multiplier(&self.params, aux, sk)
    }

    pub fn decrypt(&self, ct: &Waters08Ciphertext, sk: &Waters08PrivateKey) -> Result<Vec<u8>> {
        decrypt(&self.params, ct, sk)
    }

    pub fn seal(&self, matrix: &ShareGeneratingMatrix, plaintext: &[u8]) -> Result<Waters08Ciphertext> {
        seal(&self.params, matrix, plaintext, &mut *self.rngs.next_rng())
    }

    pub fn open(&self, ct: &Waters08Ciphertext, sk: &Waters08PrivateKey) -> Result<Vec<u8>> {
        open(&self.params, ct, sk)
    }
}
