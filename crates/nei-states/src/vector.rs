//! Ionic fractions of a single element.

use crate::error::{StateError, StateResult};
use nei_atomic::Element;
use nei_core::{Tolerances, nearly_equal, stable_sum};
use serde::Serialize;
use std::fmt;

/// Default absolute tolerance for ionic fraction comparisons.
pub const DEFAULT_TOLERANCE: f64 = 1e-15;

/// One charge state of an element and its fraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeState {
    pub charge: usize,
    pub fraction: f64,
    pub label: String,
}

/// Probability vector over the charge states `0..=Z` of one element.
///
/// Every entry lies in `[0, 1]` and the entries sum to one within `tol`
/// plus a rounding allowance proportional to `Z + 1`. The fractions
/// are only ever replaced whole.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IonizationStateVector {
    element: Element,
    fractions: Vec<f64>,
    tol: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    density_scale: Option<f64>,
}

impl IonizationStateVector {
    /// Validate `fractions` for `element`.
    pub fn new(element: Element, fractions: Vec<f64>, tol: f64) -> StateResult<Self> {
        validate_tolerance(tol)?;
        validate_fractions(element, &fractions, tol)?;
        Ok(Self {
            element,
            fractions,
            tol,
            density_scale: None,
        })
    }

    /// Entirely neutral element.
    pub fn neutral(element: Element, tol: f64) -> StateResult<Self> {
        let mut fractions = vec![0.0; element.nstates()];
        fractions[0] = 1.0;
        Self::new(element, fractions, tol)
    }

    /// Clamp negatives to zero and scale to unit sum before validating.
    ///
    /// Used for vectors produced by numerical integration, where small
    /// negative components and rounding drift are expected.
    pub fn from_unnormalized(
        element: Element,
        mut fractions: Vec<f64>,
        tol: f64,
    ) -> StateResult<Self> {
        let symbol = element.symbol();
        if let Some((charge, &value)) = fractions.iter().enumerate().find(|(_, v)| !v.is_finite())
        {
            return Err(StateError::FractionOutOfRange {
                symbol,
                charge,
                value,
            });
        }
        for v in fractions.iter_mut() {
            *v = v.max(0.0);
        }
        let sum = stable_sum(&fractions);
        if sum <= 0.0 {
            return Err(StateError::NotNormalized { symbol, sum, tol });
        }
        fractions.iter_mut().for_each(|v| *v /= sum);
        Self::new(element, fractions, tol)
    }

    /// Attach the number density of the element (atoms plus ions).
    pub fn with_density_scale(mut self, density: f64) -> StateResult<Self> {
        if !density.is_finite() || density < 0.0 {
            return Err(StateError::InvalidQuantity {
                what: "element number density",
                value: density,
            });
        }
        self.density_scale = Some(density);
        Ok(self)
    }

    pub fn element(&self) -> Element {
        self.element
    }

    pub fn atomic_number(&self) -> u8 {
        self.element.atomic_number()
    }

    pub fn nstates(&self) -> usize {
        self.fractions.len()
    }

    pub fn fractions(&self) -> &[f64] {
        &self.fractions
    }

    pub fn into_fractions(self) -> Vec<f64> {
        self.fractions
    }

    pub fn fraction(&self, charge: usize) -> Option<f64> {
        self.fractions.get(charge).copied()
    }

    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// Change the tolerance; the current fractions must satisfy it.
    pub fn set_tol(&mut self, tol: f64) -> StateResult<()> {
        validate_tolerance(tol)?;
        validate_fractions(self.element, &self.fractions, tol)?;
        self.tol = tol;
        Ok(())
    }

    pub fn density_scale(&self) -> Option<f64> {
        self.density_scale
    }

    /// Replace every fraction at once; on error nothing changes.
    pub fn set_fractions(&mut self, fractions: Vec<f64>) -> StateResult<()> {
        validate_fractions(self.element, &fractions, self.tol)?;
        self.fractions = fractions;
        Ok(())
    }

    /// Mean integer charge, `Σ k f_k`.
    pub fn mean_charge(&self) -> f64 {
        self.fractions
            .iter()
            .enumerate()
            .map(|(k, f)| k as f64 * f)
            .sum()
    }

    /// Root-mean-square integer charge, `sqrt(Σ k² f_k)`.
    pub fn rms_charge(&self) -> f64 {
        self.fractions
            .iter()
            .enumerate()
            .map(|(k, f)| (k * k) as f64 * f)
            .sum::<f64>()
            .sqrt()
    }

    pub fn is_normalized(&self, tol: f64) -> bool {
        sums_to_one(&self.fractions, tol)
    }

    /// Rescale so the fractions sum to one.
    pub fn normalize(&mut self) {
        let sum = stable_sum(&self.fractions);
        if sum > 0.0 {
            self.fractions.iter_mut().for_each(|v| *v /= sum);
        }
    }

    /// Number density of each charge state.
    pub fn number_densities(&self) -> StateResult<Vec<f64>> {
        let scale = self.density_scale.ok_or(StateError::MissingDensity {
            symbol: self.element.symbol(),
        })?;
        Ok(self.fractions.iter().map(|f| scale * f).collect())
    }

    /// Electron density contributed by this element alone.
    pub fn electron_density(&self) -> StateResult<f64> {
        let scale = self.density_scale.ok_or(StateError::MissingDensity {
            symbol: self.element.symbol(),
        })?;
        Ok(scale * self.mean_charge())
    }

    /// Elementwise comparison using the tighter of the two tolerances.
    pub fn approx_eq(&self, other: &Self) -> StateResult<bool> {
        if self.element != other.element {
            return Err(StateError::ElementMismatch {
                left: self.element.symbol(),
                right: other.element.symbol(),
            });
        }
        Ok(self.within(other, self.tol.min(other.tol)))
    }

    pub(crate) fn within(&self, other: &Self, tol: f64) -> bool {
        self.fractions
            .iter()
            .zip(&other.fractions)
            .all(|(&a, &b)| nearly_equal(a, b, Tolerances { abs: tol, rel: f64::EPSILON }))
    }

    pub fn iter(&self) -> impl Iterator<Item = ChargeState> + '_ {
        self.fractions
            .iter()
            .enumerate()
            .map(|(charge, &fraction)| ChargeState {
                charge,
                fraction,
                label: self.element.ion_label(charge),
            })
    }
}

impl fmt::Display for IonizationStateVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} (Z = {})", self.element.name(), self.atomic_number())?;
        for state in self.iter() {
            writeln!(f, "  {:<8} {:.6e}", state.label, state.fraction)?;
        }
        write!(f, "  Z_mean = {:.4}", self.mean_charge())
    }
}

pub(crate) fn validate_tolerance(tol: f64) -> StateResult<()> {
    if !(0.0..1.0).contains(&tol) {
        return Err(StateError::InvalidTolerance { value: tol });
    }
    Ok(())
}

/// `|Σf - 1| <= tol`, plus a few ulps of rounding per entry.
fn sums_to_one(fractions: &[f64], tol: f64) -> bool {
    let allowance = 4.0 * fractions.len() as f64 * f64::EPSILON;
    nearly_equal(stable_sum(fractions), 1.0, Tolerances::absolute(tol + allowance))
}

fn validate_fractions(element: Element, fractions: &[f64], tol: f64) -> StateResult<()> {
    let symbol = element.symbol();
    if fractions.len() != element.nstates() {
        return Err(StateError::WrongLength {
            symbol,
            expected: element.nstates(),
            actual: fractions.len(),
        });
    }
    if let Some((charge, &value)) = fractions
        .iter()
        .enumerate()
        .find(|(_, v)| !(0.0..=1.0).contains(*v))
    {
        return Err(StateError::FractionOutOfRange {
            symbol,
            charge,
            value,
        });
    }
    if !sums_to_one(fractions, tol) {
        return Err(StateError::NotNormalized {
            symbol,
            sum: stable_sum(fractions),
            tol,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn he(fracs: &[f64]) -> StateResult<IonizationStateVector> {
        IonizationStateVector::new(Element::HELIUM, fracs.to_vec(), 1e-6)
    }

    #[test]
    fn accepts_normalized_fractions() {
        let v = he(&[0.25, 0.5, 0.25]).unwrap();
        assert_eq!(v.nstates(), 3);
        assert_eq!(v.fraction(1), Some(0.5));
        assert_eq!(v.fraction(3), None);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            he(&[0.5, 0.5]),
            Err(StateError::WrongLength {
                expected: 3,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn rejects_negative_and_nan() {
        assert!(matches!(
            he(&[-0.1, 0.6, 0.5]),
            Err(StateError::FractionOutOfRange { charge: 0, .. })
        ));
        assert!(he(&[f64::NAN, 0.5, 0.5]).is_err());
    }

    #[test]
    fn rejects_unnormalized() {
        assert!(matches!(
            he(&[0.2, 0.2, 0.2]),
            Err(StateError::NotNormalized { .. })
        ));
    }

    #[test]
    fn rejects_bad_tolerance() {
        let r = IonizationStateVector::new(Element::HYDROGEN, vec![1.0, 0.0], 1.0);
        assert_eq!(r.unwrap_err(), StateError::InvalidTolerance { value: 1.0 });
        let r = IonizationStateVector::new(Element::HYDROGEN, vec![1.0, 0.0], -1e-9);
        assert!(r.is_err());
    }

    #[test]
    fn mean_and_rms_charge() {
        let v = he(&[0.0, 0.5, 0.5]).unwrap();
        assert!((v.mean_charge() - 1.5).abs() < 1e-15);
        assert!((v.rms_charge() - 2.5f64.sqrt()).abs() < 1e-15);
    }

    #[test]
    fn from_unnormalized_clamps_and_scales() {
        let v = IonizationStateVector::from_unnormalized(
            Element::HELIUM,
            vec![2.0, -1e-18, 6.0],
            DEFAULT_TOLERANCE,
        )
        .unwrap();
        assert_eq!(v.fractions()[1], 0.0);
        assert!((v.fractions()[0] - 0.25).abs() < 1e-15);
        assert!(v.is_normalized(DEFAULT_TOLERANCE));
    }

    #[test]
    fn set_fractions_is_all_or_nothing() {
        let mut v = he(&[1.0, 0.0, 0.0]).unwrap();
        assert!(v.set_fractions(vec![0.5, 0.6, 0.0]).is_err());
        assert_eq!(v.fractions(), &[1.0, 0.0, 0.0]);
        v.set_fractions(vec![0.0, 0.0, 1.0]).unwrap();
        assert_eq!(v.mean_charge(), 2.0);
    }

    #[test]
    fn densities_need_a_scale() {
        let v = he(&[0.0, 0.5, 0.5]).unwrap();
        assert!(matches!(
            v.number_densities(),
            Err(StateError::MissingDensity { symbol: "He" })
        ));
        let v = v.with_density_scale(10.0).unwrap();
        assert_eq!(v.number_densities().unwrap(), vec![0.0, 5.0, 5.0]);
        assert!((v.electron_density().unwrap() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn approx_eq_uses_tighter_tolerance() {
        let a = IonizationStateVector::new(Element::HYDROGEN, vec![1.0, 0.0], 1e-6).unwrap();
        let b = IonizationStateVector::new(Element::HYDROGEN, vec![1.0 - 5e-7, 5e-7], 1e-6)
            .unwrap();
        assert!(a.approx_eq(&b).unwrap());

        let a = IonizationStateVector::new(Element::HYDROGEN, vec![1.0, 0.0], 1e-8).unwrap();
        let b = IonizationStateVector::new(Element::HYDROGEN, vec![1.0 - 1e-6, 1e-6], 1e-5)
            .unwrap();
        assert!(!a.approx_eq(&b).unwrap());
    }

    #[test]
    fn approx_eq_rejects_other_elements() {
        let h = IonizationStateVector::neutral(Element::HYDROGEN, 1e-6).unwrap();
        let he = IonizationStateVector::neutral(Element::HELIUM, 1e-6).unwrap();
        assert!(h.approx_eq(&he).is_err());
    }

    #[test]
    fn iterates_labelled_states() {
        let v = he(&[0.1, 0.2, 0.7]).unwrap();
        let labels: Vec<String> = v.iter().map(|s| s.label).collect();
        assert_eq!(labels, ["He 0+", "He 1+", "He 2+"]);
        assert!(v.to_string().contains("Helium"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalized_after_clamp(raw in prop::collection::vec(-1e-3_f64..1.0, 9)) {
            let oxygen = Element::from_atomic_number(8).unwrap();
            if raw.iter().any(|v| *v > 0.0) {
                let v = IonizationStateVector::from_unnormalized(oxygen, raw, DEFAULT_TOLERANCE)
                    .unwrap();
                prop_assert!(v.fractions().iter().all(|f| *f >= 0.0));
                prop_assert!(v.is_normalized(DEFAULT_TOLERANCE));
            }
        }

        #[test]
        fn mean_charge_is_bounded(raw in prop::collection::vec(0.0_f64..1.0, 3)) {
            prop_assume!(raw.iter().sum::<f64>() > 1e-9);
            let v = IonizationStateVector::from_unnormalized(Element::HELIUM, raw, 1e-12).unwrap();
            prop_assert!(v.mean_charge() >= 0.0);
            prop_assert!(v.mean_charge() <= 2.0 + 1e-12);
            prop_assert!(v.rms_charge() + 1e-12 >= v.mean_charge());
        }
    }
}
