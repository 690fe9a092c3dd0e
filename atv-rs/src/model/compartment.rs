use super::Expr;
use crate::params::ParamKey;
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A named population bucket inside a stratum.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct CompartmentDef {
    name: String,
    description: String,
}

/// Declare a compartment.
pub fn compartment(name: &str, description: &str) -> CompartmentDef {
    CompartmentDef {
        name: name.to_string(),
        description: description.to_string(),
    }
}

/// Constraint on the values an attribute may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeKind {
    /// Finite and non-negative (per day).
    Rate,
    /// Inside [0, 1].
    Probability,
}

impl AttributeKind {
    /// Return a description of the violation, if value is not acceptable.
    pub fn check(&self, value: crate::Real) -> Option<String> {
        match self {
            _ if !value.is_finite() => Some(format!("{} is not finite", value)),
            AttributeKind::Rate if value < 0.0 => Some(format!("rate {} is negative", value)),
            AttributeKind::Probability if !(0.0..=1.0).contains(&value) => {
                Some(format!("probability {} is outside [0, 1]", value))
            }
            _ => None,
        }
    }
}

/// An attribute a stratum (or the meta layer) requires to evaluate its rates.
/// Values are supplied per day and location at scenario build time.
#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct AttributeDef {
    key: ParamKey,
    kind: AttributeKind,
    comment: String,
}

impl AttributeDef {
    pub fn new(key: ParamKey, kind: AttributeKind, comment: &str) -> Self {
        AttributeDef {
            key,
            kind,
            comment: comment.to_string(),
        }
    }
}

/// A compartment qualified by its stratum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Getters)]
#[getset(get = "pub")]
pub struct CompartmentRef {
    stratum: String,
    compartment: String,
}

impl CompartmentRef {
    pub fn new(stratum: &str, compartment: &str) -> Self {
        CompartmentRef {
            stratum: stratum.to_string(),
            compartment: compartment.to_string(),
        }
    }
}

impl Display for CompartmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.compartment, self.stratum)
    }
}

/// Endpoint of a transition: a compartment or one of the exogenous sinks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node<C> {
    Birth,
    Death,
    Compartment(C),
}

impl<C> Node<C> {
    pub fn compartment(&self) -> Option<&C> {
        match self {
            Node::Compartment(c) => Some(c),
            _ => None,
        }
    }

    pub fn try_map<D, E>(&self, f: impl FnOnce(&C) -> Result<D, E>) -> Result<Node<D>, E> {
        Ok(match self {
            Node::Birth => Node::Birth,
            Node::Death => Node::Death,
            Node::Compartment(c) => Node::Compartment(f(c)?),
        })
    }
}

impl<C: Display> Display for Node<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Birth => write!(f, "BIRTH"),
            Node::Death => write!(f, "DEATH"),
            Node::Compartment(c) => write!(f, "{}", c),
        }
    }
}

/// Variables that may appear in rate expressions while a model is declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// Population of a compartment at the current location.
    Pop(CompartmentRef),
    /// Value of an attribute at the current location and day.
    Attr(ParamKey),
}

impl Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Pop(c) => write!(f, "{}", c),
            Symbol::Attr(k) => write!(f, "{}", k.name()),
        }
    }
}

/// Population of a compartment, as a rate expression.
pub fn pop(stratum: &str, compartment: &str) -> Expr<Symbol> {
    Expr::Var(Symbol::Pop(CompartmentRef::new(stratum, compartment)))
}

/// Value of an attribute, as a rate expression.
pub fn attr(key: ParamKey) -> Expr<Symbol> {
    Expr::Var(Symbol::Attr(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_kinds_check_values() {
        assert_eq!(AttributeKind::Rate.check(0.0), None);
        assert!(AttributeKind::Rate.check(-0.1).is_some());
        assert!(AttributeKind::Rate.check(crate::NAN).is_some());
        assert_eq!(AttributeKind::Probability.check(1.0), None);
        assert!(AttributeKind::Probability.check(1.5).is_some());
    }

    #[test]
    fn labels_follow_compartment_stratum_convention() {
        let node: Node<CompartmentRef> = Node::Compartment(CompartmentRef::new("adult", "R_c"));
        assert_eq!(node.to_string(), "R_c_adult");
        assert_eq!(Node::<CompartmentRef>::Birth.to_string(), "BIRTH");
    }
}
