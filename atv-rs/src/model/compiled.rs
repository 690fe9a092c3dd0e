use super::{AttributeDef, CompartmentDef, CompartmentRef, Expr, Node};
use crate::{Error, Real, Result};
use getset::{CopyGetters, Getters};
use std::ops::Range;

/// Resolved variable of a rate expression: an index into the compartment list
/// or into the attribute list of a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Pop(usize),
    Attr(usize),
}

/// Where a transition was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Inside the stratum with the given index.
    Within(usize),
    /// Between strata (meta edge).
    Cross,
}

/// A transition with endpoints and rate resolved to flat indices.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct Transition {
    #[getset(get_copy = "pub")]
    kind: EdgeKind,
    #[getset(get = "pub")]
    from: Node<usize>,
    #[getset(get = "pub")]
    to: Node<usize>,
    #[getset(get = "pub")]
    rate: Expr<Slot>,
    #[getset(get = "pub")]
    label: String,
}

impl Transition {
    pub(crate) fn new(
        kind: EdgeKind,
        from: Node<usize>,
        to: Node<usize>,
        rate: Expr<Slot>,
        label: String,
    ) -> Self {
        Transition {
            kind,
            from,
            to,
            rate,
            label,
        }
    }

    /// Evaluate the rate given the populations of all compartments and the
    /// values of all attributes at one location and day.
    pub fn eval(&self, populations: &[Real], attributes: &[Real]) -> Real {
        self.rate.eval(&|slot: &Slot| match *slot {
            Slot::Pop(i) => populations[i],
            Slot::Attr(j) => attributes[j],
        })
    }
}

/// A compartment together with its position in the model.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct CompartmentInfo {
    #[getset(get_copy = "pub")]
    stratum: usize,
    #[getset(get = "pub")]
    def: CompartmentDef,
    /// Qualified label, e.g. "S_offspring".
    #[getset(get = "pub")]
    label: String,
}

impl CompartmentInfo {
    pub(crate) fn new(stratum: usize, def: CompartmentDef, label: String) -> Self {
        CompartmentInfo { stratum, def, label }
    }
}

#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct StratumInfo {
    #[getset(get = "pub")]
    name: String,
    #[getset(get_copy = "pub")]
    mobile: bool,
    #[getset(get = "pub")]
    compartments: Range<usize>,
}

impl StratumInfo {
    pub(crate) fn new(name: String, mobile: bool, compartments: Range<usize>) -> Self {
        StratumInfo {
            name,
            mobile,
            compartments,
        }
    }
}

/// An immutable, fully resolved compartmental model.
///
/// Compartments of all strata are laid out in a single flat list (strata in
/// declaration order), so a population state at one location is just a slice
/// indexed by compartment. Built by [`super::ModelBuilder`].
#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Model {
    strata: Vec<StratumInfo>,
    compartments: Vec<CompartmentInfo>,
    attributes: Vec<AttributeDef>,
    transitions: Vec<Transition>,
    /// For each compartment, the transitions that drain it.
    outflows: Vec<Vec<usize>>,
    /// Transitions out of BIRTH.
    births: Vec<usize>,
}

impl Model {
    pub(crate) fn new(
        strata: Vec<StratumInfo>,
        compartments: Vec<CompartmentInfo>,
        attributes: Vec<AttributeDef>,
        transitions: Vec<Transition>,
    ) -> Self {
        let mut outflows = vec![vec![]; compartments.len()];
        let mut births = vec![];
        for (k, t) in transitions.iter().enumerate() {
            match t.from() {
                Node::Compartment(i) => outflows[*i].push(k),
                Node::Birth => births.push(k),
                Node::Death => {}
            }
        }
        Model {
            strata,
            compartments,
            attributes,
            transitions,
            outflows,
            births,
        }
    }

    pub fn n_compartments(&self) -> usize {
        self.compartments.len()
    }

    pub fn n_transitions(&self) -> usize {
        self.transitions.len()
    }

    pub fn stratum_index(&self, name: &str) -> Option<usize> {
        self.strata.iter().position(|s| s.name() == name)
    }

    /// Range of flat compartment indices belonging to the named stratum.
    pub fn stratum_compartments(&self, name: &str) -> Result<Range<usize>> {
        self.stratum_index(name)
            .map(|i| self.strata[i].compartments().clone())
            .ok_or_else(|| Error::UnknownStratum(name.to_string()))
    }

    /// Flat index of a qualified compartment.
    pub fn compartment_index(&self, c: &CompartmentRef) -> Option<usize> {
        let range = self.stratum_compartments(c.stratum()).ok()?;
        range
            .clone()
            .find(|&i| self.compartments[i].def().name() == c.compartment())
    }

    pub fn compartment_labels(&self) -> Vec<String> {
        self.compartments.iter().map(|c| c.label().clone()).collect()
    }

    pub fn transition_labels(&self) -> Vec<String> {
        self.transitions.iter().map(|t| t.label().clone()).collect()
    }

    /// Evaluate all transition rates at one location and day, writing them to
    /// out (cleared first).
    pub fn rates_into(&self, populations: &[Real], attributes: &[Real], out: &mut Vec<Real>) {
        out.clear();
        out.extend(
            self.transitions
                .iter()
                .map(|t| t.eval(populations, attributes)),
        );
    }

    /// Human readable listing of strata, compartments and transitions.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for st in self.strata.iter() {
            let mobility = if st.mobile() { "mobile" } else { "stationary" };
            out.push_str(&format!("stratum {} ({}):\n", st.name(), mobility));
            for c in &self.compartments[st.compartments().clone()] {
                out.push_str(&format!("  {:<12} {}\n", c.label(), c.def().description()));
            }
        }
        out.push_str("transitions:\n");
        for t in self.transitions.iter() {
            let named: Expr<String> = t
                .rate()
                .try_map(&mut |slot: &Slot| -> std::result::Result<String, ()> {
                    Ok(match *slot {
                        Slot::Pop(i) => self.compartments[i].label().clone(),
                        Slot::Attr(j) => self.attributes[j].key().to_string(),
                    })
                })
                .unwrap_or_else(|_| Expr::Const(crate::NAN));
            out.push_str(&format!("  {:<28} {}\n", t.label(), named));
        }
        out
    }

    /// Evaluate all transition rates at one location and day.
    pub fn rates(&self, populations: &[Real], attributes: &[Real]) -> Vec<Real> {
        let mut out = Vec::with_capacity(self.transitions.len());
        self.rates_into(populations, attributes, &mut out);
        out
    }
}
