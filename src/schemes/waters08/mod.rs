//! `Waters08` CP-ABE scheme by Brent Waters.
//!
//! * Developped by Brent Waters, "Ciphertext-Policy Attribute-Based Encryption: An Expressive, Efficient, and Provably Secure Realization", see Section 3
//! * Published in Public Key Cryptography – PKC 2011
//! * Available from <https://eprint.iacr.org/2008/290.pdf>
//! * Type: encryption (attribute-based)
//! * Setting: bilinear groups (asymmetric)
//!
//! Policies are linear secret sharing matrices compiled from monotone
//! AND/OR trees. Attributes are registered with the public parameters, each
//! receiving a fresh id and a random group element `h`.
//!
//! [`encrypt`] / [`decrypt`] mask the payload with a keystream derived from
//! the multiplier `e(g1, g2)^(alpha s)`. A key that does not satisfy the
//! policy silently decrypts to different bytes. [`seal`] / [`open`] wrap the
//! same multiplier into AES-256-GCM and fail with
//! [`AbeError::Decryption`] instead.
//!
//! # Examples
//!
//! ```
//! use waters_abe::schemes::waters08::*;
//! use waters_abe::utils::policy::AccessPolicy;
//! let mut rng = rand::thread_rng();
//! let (pp, msk) = setup(254, &mut rng).unwrap();
//! for name in ["A", "B", "C", "D"] {
//!     pp.register_attribute(name, &mut rng).unwrap();
//! }
//! let policy = AccessPolicy::and(
//!     AccessPolicy::leaf("A"),
//!     AccessPolicy::or(
//!         AccessPolicy::leaf("C"),
//!         AccessPolicy::and(AccessPolicy::leaf("B"), AccessPolicy::leaf("D")),
//!     ),
//! );
//! let matrix = pp.compile_policy(&policy).unwrap();
//! let plaintext = String::from("our plaintext!").into_bytes();
//! let ct = encrypt(&pp, &matrix, &plaintext, &mut rng).unwrap();
//! let sk = keygen(&pp, &msk, &["A", "B", "D"], &mut rng).unwrap();
//! assert_eq!(decrypt(&pp, &ct, &sk).unwrap(), plaintext);
//! ```
mod codec;
pub mod scheme;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use rabe_bn::{pairing, Fr, Gt, G1, G2};
use rand::{CryptoRng, Rng, RngCore};
use tracing::{debug, warn};
use crate::error::{AbeError, Result};
use crate::utils::{
    aes::{decrypt_symmetric, encrypt_symmetric},
    file::encode_element,
    hash::shake_keystream,
    policy::{msp::ShareGeneratingMatrix, AccessPolicy, AttributeResolver},
    secret::{Ephemeral, Multiplier},
    secretsharing::gen_shares_msp,
    tools::{mul_signed_pow, u64_to_fr},
};

pub use self::scheme::{Waters08Config, Waters08Scheme};

/// Advertised at the head of every serialized parameter, key and ciphertext.
pub const SCHEME_TAG: &[u8] = b"waters08";
/// Description of the pairing recorded in the public parameters.
pub const PAIRING_DESCRIPTION: &str = "bn254 type-3 optimal ate";
/// Bit length of the BN254 group order.
pub const MAX_SECURITY_BITS: u32 = 254;

const MASK_DOMAIN: &[u8] = b"waters08/payload-mask";

/// A registered attribute.
#[derive(Clone, PartialEq, Debug)]
pub struct Waters08Attribute {
    pub name: String,
    pub id: u32,
    pub h: G1,
}

#[derive(Debug, Default)]
struct AttributeRegistry {
    by_id: BTreeMap<u32, Arc<Waters08Attribute>>,
    by_name: HashMap<String, u32>,
    next_id: u32,
}

impl AttributeRegistry {
    fn insert(&mut self, attribute: Waters08Attribute) -> Result<u32> {
        if self.by_name.contains_key(&attribute.name) {
            return Err(AbeError::AttributeExists(attribute.name));
        }
        if self.by_id.contains_key(&attribute.id) {
            return Err(AbeError::InvalidPublicParameters(format!(
                "attribute id {} assigned twice",
                attribute.id
            )));
        }
        let id = attribute.id;
        self.next_id = self.next_id.max(id.saturating_add(1));
        self.by_name.insert(attribute.name.clone(), id);
        self.by_id.insert(id, Arc::new(attribute));
        Ok(id)
    }
}

/// Public parameters (PP) with the attribute registry.
#[derive(Debug)]
pub struct Waters08PublicParameters {
    operable_bits: u32,
    pairing_description: String,
    pub g1: G1,
    pub g2: G2,
    pub g1_a: G1,
    pub e_gg_alpha: Gt,
    registry: RwLock<AttributeRegistry>,
}

/// Master secret key (MSK) `g1^alpha`.
#[derive(Debug)]
pub struct Waters08MasterKey {
    g1_alpha: Ephemeral<G1>,
}

/// A private key (SK) for a set of attribute ids.
///
/// Group elements are encoded with `borsh`; see [`Waters08PrivateKey::to_bytes`].
#[derive(Clone, PartialEq, Debug)]
pub struct Waters08PrivateKey {
    pub k: G1,
    pub l: G2,
    pub attribute_keys: BTreeMap<u32, G1>,
}

/// The policy dependent, message independent part of a ciphertext.
#[derive(Clone, PartialEq, Debug)]
pub struct Waters08AuxiliaryCiphertext {
    pub matrix: ShareGeneratingMatrix,
    pub c_prime: G2,
    pub pairs: Vec<(G1, G2)>,
}

/// A Ciphertext (CT)
#[derive(Clone, PartialEq, Debug)]
pub struct Waters08Ciphertext {
    pub aux: Waters08AuxiliaryCiphertext,
    pub content: Vec<u8>,
}

impl Waters08PublicParameters {
    /// Draws fresh generators and master secrets for the requested security
    /// level and returns the parameters with their master key.
    pub fn initialize_randomly<R: RngCore + CryptoRng>(
        security_bits: u32,
        rng: &mut R,
    ) -> Result<(Waters08PublicParameters, Waters08MasterKey)> {
        if security_bits == 0 || security_bits > MAX_SECURITY_BITS {
            return Err(AbeError::UnsupportedSecurityLevel {
                requested: security_bits,
                max: MAX_SECURITY_BITS,
            });
        }
        let g1: G1 = rng.gen();
        let g2: G2 = rng.gen();
        let alpha = Ephemeral::new(rng.gen::<Fr>());
        let a = Ephemeral::new(rng.gen::<Fr>());
        let pp = Waters08PublicParameters {
            operable_bits: security_bits,
            pairing_description: PAIRING_DESCRIPTION.to_string(),
            g1,
            g2,
            g1_a: g1 * *a.expose(),
            e_gg_alpha: pairing(g1, g2).pow(*alpha.expose()),
            registry: RwLock::new(AttributeRegistry::default()),
        };
        let msk = Waters08MasterKey {
            g1_alpha: Ephemeral::new(g1 * *alpha.expose()),
        };
        debug!(security_bits, "initialized waters08 parameters");
        Ok((pp, msk))
    }

    pub fn operable_bits(&self) -> u32 {
        self.operable_bits
    }

    pub fn pairing_description(&self) -> &str {
        &self.pairing_description
    }

    /// Registers `name` under the next unused id with a fresh random `h`.
    pub fn register_attribute<R: RngCore + CryptoRng>(&self, name: &str, rng: &mut R) -> Result<u32> {
        if name.is_empty() {
            return Err(AbeError::InvalidAttribute("attribute names must not be empty".to_string()));
        }
        let h: G1 = rng.gen();
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        let id = registry.next_id;
        let id = registry.insert(Waters08Attribute {
            name: name.to_string(),
            id,
            h,
        })?;
        debug!(attribute = name, id, "registered attribute");
        Ok(id)
    }

    pub fn attribute(&self, name: &str) -> Option<Arc<Waters08Attribute>> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry
            .by_name
            .get(name)
            .and_then(|id| registry.by_id.get(id))
            .cloned()
    }

    pub fn attribute_by_id(&self, id: u32) -> Option<Arc<Waters08Attribute>> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry.by_id.get(&id).cloned()
    }

    /// A snapshot of all registered attributes ordered by id.
    pub fn attributes(&self) -> Vec<Arc<Waters08Attribute>> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry.by_id.values().cloned().collect()
    }

    pub fn attribute_count(&self) -> usize {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry.by_id.len()
    }

    /// Compiles a named policy against this parameter set's registry.
    pub fn compile_policy(&self, policy: &AccessPolicy) -> Result<ShareGeneratingMatrix> {
        policy.to_access_tree(self)?.compile()
    }

    fn restore(
        operable_bits: u32,
        pairing_description: String,
        elements: (G1, G2, G1, Gt),
        attributes: Vec<Waters08Attribute>,
    ) -> Result<Waters08PublicParameters> {
        let mut registry = AttributeRegistry::default();
        for attribute in attributes {
            registry.insert(attribute).map_err(|e| match e {
                AbeError::AttributeExists(name) => {
                    AbeError::InvalidPublicParameters(format!("attribute {} listed twice", name))
                }
                other => other,
            })?;
        }
        let (g1, g2, g1_a, e_gg_alpha) = elements;
        Ok(Waters08PublicParameters {
            operable_bits,
            pairing_description,
            g1,
            g2,
            g1_a,
            e_gg_alpha,
            registry: RwLock::new(registry),
        })
    }
}

impl AttributeResolver for Waters08PublicParameters {
    fn attribute_id(&self, name: &str) -> Option<u32> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry.by_name.get(name).copied()
    }
}

impl Waters08MasterKey {
    pub fn g1_alpha(&self) -> &G1 {
        self.g1_alpha.expose()
    }

    fn from_element(g1_alpha: G1) -> Waters08MasterKey {
        Waters08MasterKey {
            g1_alpha: Ephemeral::new(g1_alpha),
        }
    }
}

impl Waters08PrivateKey {
    pub fn holds(&self, id: u32) -> bool {
        self.attribute_keys.contains_key(&id)
    }

    pub fn attribute_key(&self, id: u32) -> Option<&G1> {
        self.attribute_keys.get(&id)
    }

    pub fn attribute_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.attribute_keys.keys().copied()
    }
}

/// Checks `e(g1^alpha, g2) == e(g1, g2)^alpha`.
pub fn verify_master_key(pp: &Waters08PublicParameters, msk: &Waters08MasterKey) -> Result<()> {
    if pairing(*msk.g1_alpha(), pp.g2) != pp.e_gg_alpha {
        return Err(AbeError::InvalidMasterSecretKey(
            "master key does not belong to these public parameters".to_string(),
        ));
    }
    Ok(())
}

/// Checks `e(K, g2) == e(g1, g2)^alpha · e(g1^a, L)` and that every
/// attribute in the key is registered.
pub fn verify_private_key(pp: &Waters08PublicParameters, sk: &Waters08PrivateKey) -> Result<()> {
    if pairing(sk.k, pp.g2) != pp.e_gg_alpha * pairing(pp.g1_a, sk.l) {
        return Err(AbeError::InvalidPrivateKey(
            "private key was not issued under these public parameters".to_string(),
        ));
    }
    if let Some(id) = sk.attribute_ids().find(|id| pp.attribute_by_id(*id).is_none()) {
        return Err(AbeError::InvalidPrivateKey(format!(
            "private key holds unregistered attribute id {}",
            id
        )));
    }
    Ok(())
}

fn verify_auxiliary(pp: &Waters08PublicParameters, aux: &Waters08AuxiliaryCiphertext) -> Result<()> {
    if aux.pairs.len() != aux.matrix.rows() {
        return Err(AbeError::InvalidCiphertext(format!(
            "{} ciphertext components for a matrix with {} rows",
            aux.pairs.len(),
            aux.matrix.rows()
        )));
    }
    if let Some(id) = aux.matrix.attribute_ids().iter().find(|id| pp.attribute_by_id(**id).is_none()) {
        return Err(AbeError::InvalidCiphertext(format!(
            "policy references unregistered attribute id {}",
            id
        )));
    }
    Ok(())
}

/// The setup algorithm. Generates public parameters with an empty attribute registry and a master key.
///
/// # Arguments
///
///	* `security_bits` - Requested security level in bits, at most MAX_SECURITY_BITS
///	* `rng` - A cryptographically secure random number generator
///
pub fn setup<R: RngCore + CryptoRng>(
    security_bits: u32,
    rng: &mut R,
) -> Result<(Waters08PublicParameters, Waters08MasterKey)> {
    Waters08PublicParameters::initialize_randomly(security_bits, rng)
}

/// The key generation algorithm over attribute names.
///
/// Unknown names fail the whole call with [`AbeError::InvalidAttribute`].
///
/// # Arguments
///
///	* `pp` - Public Parameters (PP), generated by the function setup()
///	* `msk` - A Master Key (MSK), generated by the function setup()
///	* `attributes` - Names of registered attributes assigned to this user key
///	* `rng` - A cryptographically secure random number generator
///
pub fn keygen<R: RngCore + CryptoRng>(
    pp: &Waters08PublicParameters,
    msk: &Waters08MasterKey,
    attributes: &[&str],
    rng: &mut R,
) -> Result<Waters08PrivateKey> {
    let resolved = attributes
        .iter()
        .map(|name| {
            pp.attribute(name)
                .ok_or_else(|| AbeError::InvalidAttribute(format!("attribute {} is not registered", name)))
        })
        .collect::<Result<Vec<_>>>()?;
    generate_private_key(pp, msk, &resolved, rng)
}

/// The key generation algorithm over attribute ids.
///
/// # Arguments
///
///	* `pp` - Public Parameters (PP), generated by the function setup()
///	* `msk` - A Master Key (MSK), generated by the function setup()
///	* `ids` - Ids of registered attributes assigned to this user key
///	* `rng` - A cryptographically secure random number generator
///
pub fn keygen_from_ids<R: RngCore + CryptoRng>(
    pp: &Waters08PublicParameters,
    msk: &Waters08MasterKey,
    ids: &[u32],
    rng: &mut R,
) -> Result<Waters08PrivateKey> {
    let resolved = ids
        .iter()
        .map(|id| {
            pp.attribute_by_id(*id)
                .ok_or_else(|| AbeError::InvalidAttribute(format!("attribute id {} is not registered", id)))
        })
        .collect::<Result<Vec<_>>>()?;
    generate_private_key(pp, msk, &resolved, rng)
}

fn generate_private_key<R: RngCore + CryptoRng>(
    pp: &Waters08PublicParameters,
    msk: &Waters08MasterKey,
    attributes: &[Arc<Waters08Attribute>],
    rng: &mut R,
) -> Result<Waters08PrivateKey> {
    if attributes.is_empty() {
        return Err(AbeError::InvalidAttribute("empty attribute set".to_string()));
    }
    verify_master_key(pp, msk)?;
    let t = Ephemeral::new(rng.gen::<Fr>());
    let mut attribute_keys = BTreeMap::new();
    for attribute in attributes {
        attribute_keys
            .entry(attribute.id)
            .or_insert_with(|| attribute.h * *t.expose());
    }
    debug!(attributes = attribute_keys.len(), "generated private key");
    Ok(Waters08PrivateKey {
        k: *msk.g1_alpha() + pp.g1_a * *t.expose(),
        l: pp.g2 * *t.expose(),
        attribute_keys,
    })
}

/// Computes the auxiliary ciphertext for `matrix` and the multiplier
/// `e(g1, g2)^(alpha s)` it hides.
///
/// # Arguments
///
///	* `pp` - Public Parameters (PP), generated by the function setup()
///	* `matrix` - A share generating matrix, compiled from an access policy over attributes registered with `pp`
///	* `rng` - A cryptographically secure random number generator
///
pub fn compute_auxiliary<R: RngCore + CryptoRng>(
    pp: &Waters08PublicParameters,
    matrix: &ShareGeneratingMatrix,
    rng: &mut R,
) -> Result<(Waters08AuxiliaryCiphertext, Multiplier)> {
    let attributes = matrix
        .attribute_ids()
        .iter()
        .map(|id| {
            pp.attribute_by_id(*id)
                .ok_or_else(|| AbeError::InvalidAttribute(format!("attribute id {} is not registered", id)))
        })
        .collect::<Result<Vec<_>>>()?;
    let v: Vec<Ephemeral<Fr>> = (0..matrix.columns()).map(|_| Ephemeral::new(rng.gen())).collect();
    let s = v.first().ok_or(AbeError::EmptyMatrix)?;
    let lambda = gen_shares_msp(matrix.matrix(), &v)?;
    let mut pairs = Vec::with_capacity(matrix.rows());
    for (attribute, lambda_i) in attributes.iter().zip(&lambda) {
        let r_i = Ephemeral::new(rng.gen::<Fr>());
        pairs.push((
            pp.g1_a * *lambda_i.expose() - attribute.h * *r_i.expose(),
            pp.g2 * *r_i.expose(),
        ));
    }
    debug!(rows = matrix.rows(), columns = matrix.columns(), "computed auxiliary ciphertext");
    Ok((
        Waters08AuxiliaryCiphertext {
            matrix: matrix.clone(),
            c_prime: pp.g2 * *s.expose(),
            pairs,
        },
        Ephemeral::new(pp.e_gg_alpha.pow(*s.expose())),
    ))
}

/// Recovers the multiplier of `aux` from the rows `sk` holds.
///
/// A key that does not satisfy the policy yields a different element and no
/// error; so does a key holding none of the rows.
///
/// # Arguments
///
///	* `pp` - Public Parameters (PP), generated by the function setup()
///	* `aux` - An auxiliary ciphertext, generated by the function compute_auxiliary()
///	* `sk` - A Private Key (SK), generated by the function keygen() or keygen_from_ids()
///
pub fn compute_multiplier(
    pp: &Waters08PublicParameters,
    aux: &Waters08AuxiliaryCiphertext,
    sk: &Waters08PrivateKey,
) -> Result<Multiplier> {
    verify_private_key(pp, sk)?;
    verify_auxiliary(pp, aux)?;
    let unavailable = aux.matrix.unavailable_rows(|id| sk.holds(id));
    if unavailable.len() == aux.matrix.rows() {
        warn!(rows = aux.matrix.rows(), "private key holds no attribute of the policy");
    }
    let w = aux.matrix.reconstruction_coefficients(&unavailable)?;
    let scale_inverse = u64_to_fr(w.scale().unsigned_abs())?
        .inverse()
        .ok_or(AbeError::CoefficientOverflow)?;
    let mut denominator = Ephemeral::new(Gt::one());
    for (row, (c_i, d_i)) in aux.pairs.iter().enumerate() {
        let w_i = w.coefficient(row);
        if w_i == 0 || unavailable.contains(&row) {
            continue;
        }
        let k_x = aux
            .matrix
            .attribute_id(row)
            .and_then(|id| sk.attribute_key(id))
            .ok_or_else(|| AbeError::InvalidCiphertext(format!("row {} has no attribute", row)))?;
        let term = pairing(*c_i, sk.l) * pairing(*k_x, *d_i);
        denominator = Ephemeral::new(mul_signed_pow(*denominator.expose(), term, w_i, scale_inverse)?);
    }
    let numerator = Ephemeral::new(pairing(sk.k, aux.c_prime));
    debug!(
        rows = aux.matrix.rows(),
        held = aux.matrix.rows() - unavailable.len(),
        "computed multiplier"
    );
    Ok(Ephemeral::new(*numerator.expose() * denominator.expose().inverse()))
}

fn mask(multiplier: &Multiplier, data: &[u8]) -> Result<Vec<u8>> {
    let encoded = zeroize::Zeroizing::new(encode_element(multiplier.expose())?);
    let keystream = shake_keystream(MASK_DOMAIN, &encoded, data.len());
    Ok(data.iter().zip(keystream.iter()).map(|(d, k)| d ^ k).collect())
}

/// The encrypt algorithm. Masks `plaintext` under the policy `matrix`.
///
/// # Arguments
///
///	* `pp` - Public Parameters (PP), generated by the function setup()
///	* `matrix` - A share generating matrix, compiled from an access policy over attributes registered with `pp`
///	* `plaintext` - plaintext data given as a slice of u8
///	* `rng` - A cryptographically secure random number generator
///
pub fn encrypt<R: RngCore + CryptoRng>(
    pp: &Waters08PublicParameters,
    matrix: &ShareGeneratingMatrix,
    plaintext: &[u8],
    rng: &mut R,
) -> Result<Waters08Ciphertext> {
    let (aux, multiplier) = compute_auxiliary(pp, matrix, rng)?;
    let content = mask(&multiplier, plaintext)?;
    drop(multiplier);
    Ok(Waters08Ciphertext { aux, content })
}

/// The decrypt algorithm. Returns different bytes, not an error, when `sk`
/// does not satisfy the policy.
///
/// # Arguments
///
///	* `pp` - Public Parameters (PP), generated by the function setup()
///	* `ct` - A Waters08 Ciphertext, generated by the function encrypt()
///	* `sk` - A Private Key (SK), generated by the function keygen() or keygen_from_ids()
///
pub fn decrypt(
    pp: &Waters08PublicParameters,
    ct: &Waters08Ciphertext,
    sk: &Waters08PrivateKey,
) -> Result<Vec<u8>> {
    let multiplier = compute_multiplier(pp, &ct.aux, sk)?;
    mask(&multiplier, &ct.content)
}

/// Encrypts `plaintext` with AES-256-GCM keyed from the multiplier.
///
/// # Arguments
///
///	* `pp` - Public Parameters (PP), generated by the function setup()
///	* `matrix` - A share generating matrix, compiled from an access policy over attributes registered with `pp`
///	* `plaintext` - plaintext data given as a slice of u8
///	* `rng` - A cryptographically secure random number generator
///
pub fn seal<R: RngCore + CryptoRng>(
    pp: &Waters08PublicParameters,
    matrix: &ShareGeneratingMatrix,
    plaintext: &[u8],
    rng: &mut R,
) -> Result<Waters08Ciphertext> {
    let (aux, multiplier) = compute_auxiliary(pp, matrix, rng)?;
    let content = encrypt_symmetric(rng, multiplier.expose(), plaintext)?;
    Ok(Waters08Ciphertext { aux, content })
}

/// Inverse of [`seal`]; a non-satisfying key fails with
/// [`AbeError::Decryption`].
///
/// # Arguments
///
///	* `pp` - Public Parameters (PP), generated by the function setup()
///	* `ct` - A Waters08 Ciphertext, generated by the function seal()
///	* `sk` - A Private Key (SK), generated by the function keygen() or keygen_from_ids()
///
pub fn open(
    pp: &Waters08PublicParameters,
    ct: &Waters08Ciphertext,
    sk: &Waters08PrivateKey,
) -> Result<Vec<u8>> {
    let multiplier = compute_multiplier(pp, &ct.aux, sk)?;
    decrypt_symmetric(multiplier.expose(), &ct.content)
}

/// Rows of `matrix` that `sk` holds, in row order.
pub fn held_rows(matrix: &ShareGeneratingMatrix, sk: &Waters08PrivateKey) -> BTreeSet<usize> {
    (0..matrix.rows())
        .filter(|row| matrix.attribute_id(*row).map_or(false, |id| sk.holds(id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::policy::AccessPolicy;
    use rand::thread_rng;

    fn parameters() -> (Waters08PublicParameters, Waters08MasterKey) {
        let mut rng = thread_rng();
        let (pp, msk) = setup(160, &mut rng).unwrap();
        for name in ["A", "B", "C", "D"] {
            pp.register_attribute(name, &mut rng).unwrap();
        }
        (pp, msk)
    }

    fn policy() -> AccessPolicy {
        AccessPolicy::and(
            AccessPolicy::leaf("A"),
            AccessPolicy::or(
                AccessPolicy::leaf("C"),
                AccessPolicy::and(AccessPolicy::leaf("B"), AccessPolicy::leaf("D")),
            ),
        )
    }

    #[test]
    fn and_or_policy_decrypts() {
        let mut rng = thread_rng();
        let (pp, msk) = parameters();
        let matrix = pp.compile_policy(&policy()).unwrap();
        let plaintext = 123456u64.to_be_bytes();
        let ct = encrypt(&pp, &matrix, &plaintext, &mut rng).unwrap();
        let sk = keygen(&pp, &msk, &["A", "B", "D"], &mut rng).unwrap();
        let recovered = decrypt(&pp, &ct, &sk).unwrap();
        assert_eq!(u64::from_be_bytes(recovered.as_slice().try_into().unwrap()), 123456);
    }

    #[test]
    fn or_branch_decrypts() {
        let mut rng = thread_rng();
        let (pp, msk) = parameters();
        let matrix = pp.compile_policy(&policy()).unwrap();
        let plaintext = b"dance like no one's watching, encrypt like everyone is!".to_vec();
        let ct = encrypt(&pp, &matrix, &plaintext, &mut rng).unwrap();
        let sk = keygen(&pp, &msk, &["A", "C"], &mut rng).unwrap();
        assert_eq!(decrypt(&pp, &ct, &sk).unwrap(), plaintext);
    }

    #[test]
    fn unsatisfying_key_yields_other_bytes() {
        let mut rng = thread_rng();
        let (pp, msk) = parameters();
        let matrix = pp.compile_policy(&policy()).unwrap();
        let plaintext = 123456u64.to_be_bytes();
        let ct = encrypt(&pp, &matrix, &plaintext, &mut rng).unwrap();
        for attributes in [vec!["B"], vec!["B", "C", "D"], vec!["A", "B"]] {
            let sk = keygen(&pp, &msk, &attributes, &mut rng).unwrap();
            let recovered = decrypt(&pp, &ct, &sk).unwrap();
            assert_eq!(recovered.len(), plaintext.len());
            assert_ne!(recovered, plaintext.to_vec());
        }
    }

    #[test]
    fn key_without_policy_attributes_does_not_panic() {
        let mut rng = thread_rng();
        let (pp, msk) = parameters();
        pp.register_attribute("X", &mut rng).unwrap();
        let matrix = pp.compile_policy(&policy()).unwrap();
        let ct = encrypt(&pp, &matrix, b"secret", &mut rng).unwrap();
        let sk = keygen(&pp, &msk, &["X"], &mut rng).unwrap();
        assert!(held_rows(&matrix, &sk).is_empty());
        assert_ne!(decrypt(&pp, &ct, &sk).unwrap(), b"secret".to_vec());
    }

    #[test]
    fn seal_detects_unsatisfying_keys() {
        let mut rng = thread_rng();
        let (pp, msk) = parameters();
        let matrix = pp.compile_policy(&policy()).unwrap();
        let ct = seal(&pp, &matrix, b"authenticated", &mut rng).unwrap();
        let good = keygen(&pp, &msk, &["A", "B", "D"], &mut rng).unwrap();
        let bad = keygen(&pp, &msk, &["B", "D"], &mut rng).unwrap();
        assert_eq!(open(&pp, &ct, &good).unwrap(), b"authenticated".to_vec());
        assert!(matches!(open(&pp, &ct, &bad), Err(AbeError::Decryption(_))));
    }

    #[test]
    fn multiplier_matches_encryption() {
        let mut rng = thread_rng();
        let (pp, msk) = parameters();
        let matrix = pp.compile_policy(&policy()).unwrap();
        let (aux, multiplier) = compute_auxiliary(&pp, &matrix, &mut rng).unwrap();
        let sk = keygen_from_ids(&pp, &msk, &[0, 2], &mut rng).unwrap();
        let recovered = compute_multiplier(&pp, &aux, &sk).unwrap();
        assert!(*recovered.expose() == *multiplier.expose());
    }

    #[test]
    fn unknown_attributes_abort_keygen() {
        let mut rng = thread_rng();
        let (pp, msk) = parameters();
        assert!(matches!(
            keygen(&pp, &msk, &["A", "Z"], &mut rng),
            Err(AbeError::InvalidAttribute(_))
        ));
        assert!(matches!(
            keygen_from_ids(&pp, &msk, &[0, 99], &mut rng),
            Err(AbeError::InvalidAttribute(_))
        ));
        assert!(matches!(keygen(&pp, &msk, &[], &mut rng), Err(AbeError::InvalidAttribute(_))));
    }

    #[test]
    fn unregistered_policy_name_is_reported() {
        let (pp, _) = parameters();
        let policy = AccessPolicy::or(AccessPolicy::leaf("A"), AccessPolicy::leaf("Q"));
        assert!(matches!(pp.compile_policy(&policy), Err(AbeError::NoSuchAttribute(ref n)) if n == "Q"));
    }

    #[test]
    fn registry_rejects_duplicates() {
        let mut rng = thread_rng();
        let (pp, _) = setup(128, &mut rng).unwrap();
        assert_eq!(pp.register_attribute("X", &mut rng).unwrap(), 0);
        assert_eq!(pp.register_attribute("Y", &mut rng).unwrap(), 1);
        assert!(matches!(
            pp.register_attribute("X", &mut rng),
            Err(AbeError::AttributeExists(ref n)) if n == "X"
        ));
        assert_eq!(pp.attribute_count(), 2);
        assert_eq!(pp.register_attribute("Z", &mut rng).unwrap(), 2);
        let names: Vec<String> = pp.attributes().iter().map(|a| a.name.clone()).collect();
        assert_eq!(names, vec!["X", "Y", "Z"]);
    }

    #[test]
    fn unsupported_security_levels() {
        let mut rng = thread_rng();
        for bits in [0, 255, 1024] {
            assert!(matches!(
                setup(bits, &mut rng),
                Err(AbeError::UnsupportedSecurityLevel { requested, max: MAX_SECURITY_BITS }) if requested == bits
            ));
        }
    }

    #[test]
    fn foreign_keys_are_rejected() {
        let mut rng = thread_rng();
        let (pp, msk) = parameters();
        let (other_pp, other_msk) = parameters();
        assert!(matches!(
            keygen(&pp, &other_msk, &["A"], &mut rng),
            Err(AbeError::InvalidMasterSecretKey(_))
        ));
        let matrix = pp.compile_policy(&policy()).unwrap();
        let ct = encrypt(&pp, &matrix, b"secret", &mut rng).unwrap();
        let foreign = keygen(&other_pp, &other_msk, &["A", "C"], &mut rng).unwrap();
        assert!(matches!(decrypt(&pp, &ct, &foreign), Err(AbeError::InvalidPrivateKey(_))));
        let own = keygen(&pp, &msk, &["A", "C"], &mut rng).unwrap();
        assert_eq!(decrypt(&pp, &ct, &own).unwrap(), b"secret".to_vec());
    }

    #[test]
    fn truncated_auxiliary_is_rejected() {
        let mut rng = thread_rng();
        let (pp, msk) = parameters();
        let matrix = pp.compile_policy(&policy()).unwrap();
        let mut ct = encrypt(&pp, &matrix, b"secret", &mut rng).unwrap();
        ct.aux.pairs.pop();
        let sk = keygen(&pp, &msk, &["A", "C"], &mut rng).unwrap();
        assert!(matches!(decrypt(&pp, &ct, &sk), Err(AbeError::InvalidCiphertext(_))));
    }

    #[test]
    fn empty_plaintext() {
        let mut rng = thread_rng();
        let (pp, msk) = parameters();
        let matrix = pp.compile_policy(&AccessPolicy::leaf("A")).unwrap();
        let ct = encrypt(&pp, &matrix, &[], &mut rng).unwrap();
        let sk = keygen(&pp, &msk, &["A"], &mut rng).unwrap();
        assert!(decrypt(&pp, &ct, &sk).unwrap().is_empty());
    }
}
