//! Access policies over attribute names and their translation to access
//! trees over registered attribute ids.
pub mod msp;

use std::fmt::{Display, Formatter, Result as FormatResult};
#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};
use crate::error::{AbeError, Result};
use self::msp::AccessTree;

/// Resolves attribute names to the ids assigned at registration.
pub trait AttributeResolver {
    fn attribute_id(&self, name: &str) -> Option<u32>;
}

/// A monotone boolean formula over attribute names.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AccessPolicy {
    Leaf(String),
    And(Box<AccessPolicy>, Box<AccessPolicy>),
    Or(Box<AccessPolicy>, Box<AccessPolicy>),
}

impl AccessPolicy {
    pub fn leaf(name: &str) -> AccessPolicy {
        AccessPolicy::Leaf(name.to_string())
    }

    pub fn and(left: AccessPolicy, right: AccessPolicy) -> AccessPolicy {
        AccessPolicy::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: AccessPolicy, right: AccessPolicy) -> AccessPolicy {
        AccessPolicy::Or(Box::new(left), Box::new(right))
    }

    /// Attribute names in left-to-right leaf order.
    pub fn attributes(&self) -> Vec<&str> {
        match self {
            AccessPolicy::Leaf(name) => vec![name.as_str()],
            AccessPolicy::And(l, r) | AccessPolicy::Or(l, r) => {
                let mut names = l.attributes();
                names.extend(r.attributes());
                names
            }
        }
    }

    /// Replaces every leaf name by its registered id.
    pub fn to_access_tree<A: AttributeResolver + ?Sized>(&self, resolver: &A) -> Result<AccessTree> {
        match self {
            AccessPolicy::Leaf(name) => resolver
                .attribute_id(name)
                .map(AccessTree::Leaf)
                .ok_or_else(|| AbeError::NoSuchAttribute(name.clone())),
            AccessPolicy::And(l, r) => Ok(AccessTree::and(
                l.to_access_tree(resolver)?,
                r.to_access_tree(resolver)?,
            )),
            AccessPolicy::Or(l, r) => Ok(AccessTree::or(
                l.to_access_tree(resolver)?,
                r.to_access_tree(resolver)?,
            )),
        }
    }
}

impl Display for AccessPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            AccessPolicy::Leaf(name) => write!(f, "\"{}\"", name),
            AccessPolicy::And(l, r) => write!(f, "({} and {})", l, r),
            AccessPolicy::Or(l, r) => write!(f, "({} or {})", l, r),
        }
    }
}
