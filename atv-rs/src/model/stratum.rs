use super::{attr, compartment, pop, AttributeDef, AttributeKind, CompartmentDef, Expr, Node, Symbol};
use crate::params::ParamKey;
use getset::Getters;
use std::fmt::Display;

/// A directed transition from one node to another at a given rate.
///
/// C is the compartment reference type: plain compartment names for edges
/// declared inside a stratum and qualified [`super::CompartmentRef`]s for meta
/// edges that cross strata.
#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Edge<C> {
    from: Node<C>,
    to: Node<C>,
    rate: Expr<Symbol>,
}

/// Declare an edge.
pub fn edge<C>(from: Node<C>, to: Node<C>, rate: Expr<Symbol>) -> Edge<C> {
    Edge { from, to, rate }
}

impl<C: PartialEq + Display> Edge<C> {
    /// Reject edges that cannot describe a population flow.
    pub(crate) fn check_shape(&self) -> Result<(), &'static str> {
        match (&self.from, &self.to) {
            (_, Node::Birth) => Err("nothing can flow into BIRTH"),
            (Node::Death, _) => Err("nothing can flow out of DEATH"),
            (Node::Birth, Node::Death) => Err("BIRTH cannot flow directly into DEATH"),
            (a, b) if a == b => Err("source and destination are the same"),
            _ => Ok(()),
        }
    }

    pub fn label(&self) -> String {
        format!("{}->{}", self.from, self.to)
    }
}

/// A partition of the population with its own compartments, attributes and
/// internal transitions.
///
/// ```
/// use atv::model::{AttributeKind, Node, Stratum};
///
/// let st = Stratum::new("offspring")
///     .compartment("S", "susceptible offspring")
///     .compartment("I", "infected offspring")
///     .requires("death_rate", AttributeKind::Rate, "offspring mortality rate");
/// let rate = st.attr("death_rate") * st.pop("S");
/// let from = st.node("S");
/// let st = st.edge(from, Node::Death, rate);
/// assert_eq!(st.edges().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Stratum {
    #[getset(get = "pub")]
    name: String,
    #[getset(get = "pub")]
    compartments: Vec<CompartmentDef>,
    #[getset(get = "pub")]
    requirements: Vec<AttributeDef>,
    #[getset(get = "pub")]
    edges: Vec<Edge<String>>,
    mobile: bool,
}

impl Stratum {
    pub fn new(name: &str) -> Self {
        Stratum {
            name: name.to_string(),
            compartments: vec![],
            requirements: vec![],
            edges: vec![],
            mobile: false,
        }
    }

    pub fn compartment(mut self, name: &str, description: &str) -> Self {
        self.compartments.push(compartment(name, description));
        self
    }

    pub fn requires(mut self, name: &str, kind: AttributeKind, comment: &str) -> Self {
        let key = ParamKey::stratum(&self.name, name);
        self.requirements.push(AttributeDef::new(key, kind, comment));
        self
    }

    pub fn edge(mut self, from: Node<String>, to: Node<String>, rate: Expr<Symbol>) -> Self {
        self.edges.push(edge(from, to, rate));
        self
    }

    /// Mark individuals of this stratum as able to move between locations.
    pub fn mobile(mut self, mobile: bool) -> Self {
        self.mobile = mobile;
        self
    }

    pub fn is_mobile(&self) -> bool {
        self.mobile
    }

    /// Population of one of this stratum's compartments.
    pub fn pop(&self, compartment: &str) -> Expr<Symbol> {
        pop(&self.name, compartment)
    }

    /// One of this stratum's attributes.
    pub fn attr(&self, name: &str) -> Expr<Symbol> {
        attr(ParamKey::stratum(&self.name, name))
    }

    /// Edge endpoint for one of this stratum's compartments.
    pub fn node(&self, compartment: &str) -> Node<String> {
        Node::Compartment(compartment.to_string())
    }

    pub(crate) fn compartment_position(&self, name: &str) -> Option<usize> {
        self.compartments.iter().position(|c| c.name() == name)
    }
}
