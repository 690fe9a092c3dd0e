use super::{
    AttributeDef, AttributeKind, CompartmentInfo, CompartmentRef, Edge, EdgeKind, Expr, Model,
    Node, Slot, StratumInfo, Symbol, Transition, Stratum,
};
use crate::{
    params::{ParamKey, ParamScope},
    Error, Result,
};
use log::debug;
use std::collections::HashSet;

/// Assembles strata and cross-strata (meta) edges into an immutable [`Model`].
///
/// Meta edges reference qualified compartments of any stratum and attributes
/// declared either by the meta layer (see [`ModelBuilder::meta_requires`]) or
/// by any stratum. Edges declared inside a stratum may only reference that
/// stratum's compartments and attributes.
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    strata: Vec<Stratum>,
    meta_requirements: Vec<AttributeDef>,
    meta_edges: Vec<Edge<CompartmentRef>>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stratum(mut self, stratum: Stratum) -> Self {
        self.strata.push(stratum);
        self
    }

    pub fn meta_requires(mut self, name: &str, kind: AttributeKind, comment: &str) -> Self {
        self.meta_requirements
            .push(AttributeDef::new(ParamKey::meta(name), kind, comment));
        self
    }

    pub fn meta_edge(
        mut self,
        from: Node<CompartmentRef>,
        to: Node<CompartmentRef>,
        rate: Expr<Symbol>,
    ) -> Self {
        self.meta_edges.push(super::edge(from, to, rate));
        self
    }

    /// Resolve all names and validate the model.
    pub fn build(self) -> Result<Model> {
        // Strata and compartments
        let mut names = HashSet::new();
        let mut strata = Vec::with_capacity(self.strata.len());
        let mut compartments = vec![];
        for (k, st) in self.strata.iter().enumerate() {
            if !names.insert(st.name().as_str()) {
                return Err(Error::DuplicateStratum(st.name().clone()));
            }
            let start = compartments.len();
            let mut seen = HashSet::new();
            for c in st.compartments() {
                if !seen.insert(c.name().as_str()) {
                    return Err(Error::DuplicateCompartment {
                        stratum: st.name().clone(),
                        compartment: c.name().clone(),
                    });
                }
                let label = CompartmentRef::new(st.name(), c.name()).to_string();
                compartments.push(CompartmentInfo::new(k, c.clone(), label));
            }
            strata.push(StratumInfo::new(
                st.name().clone(),
                st.is_mobile(),
                start..compartments.len(),
            ));
        }

        // Attributes: strata first, then meta. Repeated keys are declared once.
        let mut attributes: Vec<AttributeDef> = vec![];
        let declared = self
            .strata
            .iter()
            .flat_map(|st| st.requirements().iter())
            .chain(self.meta_requirements.iter());
        for a in declared {
            if !attributes.iter().any(|b| b.key() == a.key()) {
                attributes.push(a.clone());
            }
        }

        let partial = Model::new(strata, compartments, attributes, vec![]);
        let mut transitions = vec![];

        for (k, st) in self.strata.iter().enumerate() {
            for e in st.edges() {
                let qualify = |name: &String| -> Result<CompartmentRef> {
                    let c = CompartmentRef::new(st.name(), name);
                    partial
                        .compartment_index(&c)
                        .map(|_| c.clone())
                        .ok_or_else(|| Error::UnknownCompartment {
                            stratum: st.name().clone(),
                            compartment: name.clone(),
                        })
                };
                let from = e.from().try_map(qualify)?;
                let to = e.to().try_map(qualify)?;
                let qualified = super::edge(from, to, e.rate().clone());
                for sym in e.rate().vars() {
                    check_local(st.name(), sym)?;
                }
                transitions.push(resolve(&partial, EdgeKind::Within(k), &qualified)?);
            }
        }
        for e in self.meta_edges.iter() {
            transitions.push(resolve(&partial, EdgeKind::Cross, e)?);
        }

        let model = Model::new(
            partial.strata().clone(),
            partial.compartments().clone(),
            partial.attributes().clone(),
            transitions,
        );
        debug!(
            target: "model",
            "built model: {} strata, {} compartments, {} attributes, {} transitions",
            model.strata().len(),
            model.n_compartments(),
            model.attributes().len(),
            model.n_transitions()
        );
        Ok(model)
    }
}

/// Edges inside a stratum may only see that stratum's symbols.
fn check_local(stratum: &str, sym: &Symbol) -> Result<()> {
    let local = match sym {
        Symbol::Pop(c) => c.stratum() == stratum,
        Symbol::Attr(key) => match key.scope() {
            ParamScope::Stratum(s) => s == stratum,
            ParamScope::Meta => false,
        },
    };
    if local {
        Ok(())
    } else {
        Err(Error::ForeignReference {
            stratum: stratum.to_string(),
            symbol: sym.to_string(),
        })
    }
}

/// Resolve a qualified edge against the compartments and attributes of model.
fn resolve(model: &Model, kind: EdgeKind, e: &Edge<CompartmentRef>) -> Result<Transition> {
    let label = e.label();
    e.check_shape().map_err(|reason| Error::InvalidEdge {
        label: label.clone(),
        reason,
    })?;

    let index = |c: &CompartmentRef| -> Result<usize> {
        model
            .compartment_index(c)
            .ok_or_else(|| match model.stratum_index(c.stratum()) {
                Some(_) => Error::UnknownCompartment {
                    stratum: c.stratum().clone(),
                    compartment: c.compartment().clone(),
                },
                None => Error::UnknownStratum(c.stratum().clone()),
            })
    };
    let from = e.from().try_map(index)?;
    let to = e.to().try_map(index)?;

    let rate = e.rate().try_map(&mut |sym: &Symbol| -> Result<Slot> {
        match sym {
            Symbol::Pop(c) => index(c).map(Slot::Pop),
            Symbol::Attr(key) => model
                .attributes()
                .iter()
                .position(|a| a.key() == key)
                .map(Slot::Attr)
                .ok_or_else(|| Error::UndeclaredAttribute {
                    label: label.clone(),
                    key: key.clone(),
                }),
        }
    })?;
    Ok(Transition::new(kind, from, to, rate, label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{pop, Node};

    fn offspring() -> Stratum {
        let st = Stratum::new("offspring")
            .compartment("S", "susceptible offspring")
            .compartment("I", "infected offspring")
            .requires("beta", AttributeKind::Rate, "transmission");
        let rate = st.attr("beta") * st.pop("S") * st.pop("I");
        let (s, i) = (st.node("S"), st.node("I"));
        st.edge(s, i, rate)
    }

    fn adult() -> Stratum {
        Stratum::new("adult")
            .compartment("R", "adults")
            .mobile(true)
    }

    #[test]
    fn builds_flat_layout() {
        let model = ModelBuilder::new()
            .stratum(offspring())
            .stratum(adult())
            .meta_requires("mature_rate", AttributeKind::Rate, "maturation")
            .meta_edge(
                Node::Compartment(CompartmentRef::new("offspring", "I")),
                Node::Compartment(CompartmentRef::new("adult", "R")),
                crate::model::attr(ParamKey::meta("mature_rate")) * pop("offspring", "I"),
            )
            .build()
            .unwrap();

        assert_eq!(
            model.compartment_labels(),
            vec!["S_offspring", "I_offspring", "R_adult"]
        );
        assert_eq!(
            model.transition_labels(),
            vec!["S_offspring->I_offspring", "I_offspring->R_adult"]
        );
        assert_eq!(model.outflows()[1], vec![1]);
        assert_eq!(model.stratum_compartments("adult").unwrap(), 2..3);
        assert!(model.strata()[1].mobile());
        assert_eq!(model.transitions()[1].kind(), EdgeKind::Cross);

        // S=4, I=2, R=0; beta=0.5, mature_rate=0.25
        let rates = model.rates(&[4.0, 2.0, 0.0], &[0.5, 0.25]);
        assert_eq!(rates, vec![4.0, 0.5]);
    }

    #[test]
    fn rejects_unknown_compartments() {
        let st = Stratum::new("offspring").compartment("S", "");
        let (s, x) = (st.node("S"), st.node("X"));
        let err = ModelBuilder::new()
            .stratum(st.edge(s, x, Expr::constant(1.0)))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::UnknownCompartment { .. }));

        let err = ModelBuilder::new()
            .stratum(adult())
            .meta_edge(
                Node::Birth,
                Node::Compartment(CompartmentRef::new("larvae", "S")),
                Expr::constant(1.0),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::UnknownStratum(_)));
    }

    #[test]
    fn rejects_foreign_references_inside_strata() {
        let st = adult();
        let r = st.node("R");
        let st = st.edge(r, Node::Death, pop("offspring", "S"));
        let err = ModelBuilder::new()
            .stratum(offspring())
            .stratum(st)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::ForeignReference { .. }));
    }

    #[test]
    fn rejects_undeclared_attributes_and_duplicates() {
        let err = ModelBuilder::new()
            .stratum(adult())
            .meta_edge(
                Node::Birth,
                Node::Compartment(CompartmentRef::new("adult", "R")),
                crate::model::attr(ParamKey::meta("birth_rate")),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::UndeclaredAttribute { .. }));

        let err = ModelBuilder::new()
            .stratum(adult())
            .stratum(adult())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateStratum(_)));
    }
}
