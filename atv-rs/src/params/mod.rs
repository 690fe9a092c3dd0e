//! Model parameters.
//!
//! Values are supplied per [`ParamKey`] as a scalar, a per-location vector or
//! a day × location table. Before a run they are checked against the
//! attributes a model requires and broadcast to a dense table indexed by day,
//! location and attribute.
mod key;

pub use key::*;

use crate::{model::AttributeDef, Error, Real, Result};
use ndarray::{prelude::*, s};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A parameter value before broadcasting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Same value everywhere, every day.
    Scalar(Real),
    /// One value per location.
    PerLocation(Vec<Real>),
    /// One row per day, one column per location.
    Table(Vec<Vec<Real>>),
}

impl AttributeValue {
    /// Broadcast value to a (days, locations) array.
    pub fn broadcast(&self, key: &ParamKey, days: usize, locations: usize) -> Result<Array2<Real>> {
        let shape_error = |found| Error::ParamShape {
            key: key.clone(),
            expected: (days, locations),
            found,
        };
        match self {
            AttributeValue::Scalar(x) => Ok(Array2::from_elem((days, locations), *x)),
            AttributeValue::PerLocation(xs) => {
                if xs.len() != locations {
                    return Err(shape_error((1, xs.len())));
                }
                let row = ArrayView1::from(xs.as_slice());
                Ok(row
                    .broadcast((days, locations))
                    .ok_or_else(|| shape_error((1, xs.len())))?
                    .to_owned())
            }
            AttributeValue::Table(rows) => {
                let width = rows.first().map(|r| r.len()).unwrap_or(0);
                if rows.len() != days || rows.iter().any(|r| r.len() != locations) {
                    return Err(shape_error((rows.len(), width)));
                }
                let mut out = Array2::zeros((days, locations));
                for (t, row) in rows.iter().enumerate() {
                    for (n, x) in row.iter().enumerate() {
                        out[(t, n)] = *x;
                    }
                }
                Ok(out)
            }
        }
    }
}

impl From<Real> for AttributeValue {
    fn from(x: Real) -> Self {
        AttributeValue::Scalar(x)
    }
}

impl From<Vec<Real>> for AttributeValue {
    fn from(xs: Vec<Real>) -> Self {
        AttributeValue::PerLocation(xs)
    }
}

impl From<Vec<Vec<Real>>> for AttributeValue {
    fn from(rows: Vec<Vec<Real>>) -> Self {
        AttributeValue::Table(rows)
    }
}

/// A set of parameter values keyed by [`ParamKey`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params {
    values: BTreeMap<ParamKey, AttributeValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: ParamKey, value: impl Into<AttributeValue>) -> &mut Self {
        self.values.insert(key, value.into());
        self
    }

    pub fn get(&self, key: &ParamKey) -> Option<&AttributeValue> {
        self.values.get(key)
    }

    /// Override values in self with the ones in other.
    pub fn merge(&mut self, other: &Params) -> &mut Self {
        for (k, v) in other.values.iter() {
            self.values.insert(k.clone(), v.clone());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &AttributeValue)> {
        self.values.iter()
    }

    /// Check and broadcast values for the given attributes.
    ///
    /// Every attribute must have a value of a compatible shape and every
    /// broadcast element must satisfy the attribute's kind. Values for keys
    /// no attribute requires are ignored.
    pub fn resolve(
        &self,
        attributes: &[AttributeDef],
        days: usize,
        locations: usize,
    ) -> Result<ResolvedParams> {
        let mut data = Array3::zeros((days, locations, attributes.len()));
        for (j, a) in attributes.iter().enumerate() {
            let value = self
                .get(a.key())
                .ok_or_else(|| Error::MissingParam(a.key().clone()))?;
            let table = value.broadcast(a.key(), days, locations)?;
            if let Some(reason) = table.iter().find_map(|&x| a.kind().check(x)) {
                return Err(Error::InvalidParam {
                    key: a.key().clone(),
                    reason,
                });
            }
            data.slice_mut(s![.., .., j]).assign(&table);
        }
        Ok(ResolvedParams {
            keys: attributes.iter().map(|a| a.key().clone()).collect(),
            data,
        })
    }
}

/// Parameter values broadcast to (day, location, attribute).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParams {
    keys: Vec<ParamKey>,
    data: Array3<Real>,
}

impl ResolvedParams {
    pub fn keys(&self) -> &[ParamKey] {
        &self.keys
    }

    /// Attribute values at one day and location, in model attribute order.
    pub fn at(&self, day: usize, location: usize) -> ArrayView1<Real> {
        self.data.slice(s![day, location, ..])
    }

    pub fn days(&self) -> usize {
        self.data.dim().0
    }

    pub fn locations(&self) -> usize {
        self.data.dim().1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeKind;

    fn defs() -> Vec<AttributeDef> {
        vec![
            AttributeDef::new(ParamKey::stratum("offspring", "beta"), AttributeKind::Rate, ""),
            AttributeDef::new(ParamKey::meta("p_vert"), AttributeKind::Probability, ""),
        ]
    }

    #[test]
    fn broadcasts_scalars_vectors_and_tables() {
        let mut params = Params::new();
        params
            .set(ParamKey::stratum("offspring", "beta"), vec![0.1, 0.2, 0.3])
            .set(ParamKey::meta("p_vert"), vec![vec![0.5, 0.5, 0.5], vec![0.6, 0.7, 0.8]]);
        let resolved = params.resolve(&defs(), 2, 3).unwrap();
        assert_eq!(
            resolved.keys(),
            &[ParamKey::stratum("offspring", "beta"), ParamKey::meta("p_vert")][..]
        );
        assert_eq!(resolved.at(1, 2).to_vec(), vec![0.3, 0.8]);
        assert_eq!(resolved.at(0, 0).to_vec(), vec![0.1, 0.5]);

        params.set(ParamKey::meta("p_vert"), 0.25);
        let resolved = params.resolve(&defs(), 2, 3).unwrap();
        assert_eq!(resolved.at(1, 1).to_vec(), vec![0.2, 0.25]);
        assert_eq!((resolved.days(), resolved.locations()), (2, 3));
    }

    #[test]
    fn reports_missing_and_invalid_values() {
        let mut params = Params::new();
        params.set(ParamKey::stratum("offspring", "beta"), 0.3);
        assert!(matches!(params.resolve(&defs(), 1, 1), Err(Error::MissingParam(_))));

        params.set(ParamKey::meta("p_vert"), 1.5);
        assert!(matches!(params.resolve(&defs(), 1, 1), Err(Error::InvalidParam { .. })));

        params.set(ParamKey::meta("p_vert"), vec![0.5, 0.5]);
        assert!(matches!(params.resolve(&defs(), 1, 3), Err(Error::ParamShape { .. })));
    }

    #[test]
    fn reads_toml_tables() {
        let params: Params = toml::from_str(
            r#"
            "gpm:offspring::ipm::beta" = 0.3
            "meta::p_vert" = [0.1, 0.2]
            "#,
        )
        .unwrap();
        assert_eq!(
            params.get(&ParamKey::stratum("offspring", "beta")),
            Some(&AttributeValue::Scalar(0.3))
        );
        assert_eq!(
            params.get(&ParamKey::meta("p_vert")),
            Some(&AttributeValue::PerLocation(vec![0.1, 0.2]))
        );
    }
}
