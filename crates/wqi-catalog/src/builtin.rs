//! Parameter tables shipped with the engine.
//!
//! `Springs`, `Wells` and `Lakes` use the linear-ratio model with weights
//! tuned per water body; `EPA` uses the ideal/limit model.

use wqi_core::{ModelError, ParameterSet, ParameterSpec, Reference, Response, ScoringModel};

pub const SPRINGS_SET: &str = "Springs";
pub const WELLS_SET: &str = "Wells";
pub const LAKES_SET: &str = "Lakes";
pub const EPA_SET: &str = "EPA";

#[derive(Debug, Clone, Copy)]
struct TableRow {
    name: &'static str,
    unit: &'static str,
    weight: f64,
    reference: Reference,
}

const fn row(name: &'static str, unit: &'static str, weight: f64, reference: Reference) -> TableRow {
    TableRow {
        name,
        unit,
        weight,
        reference,
    }
}

const fn ideal_limit(ideal: f64, limit: f64, response: Response) -> Reference {
    Reference::IdealLimit {
        ideal,
        limit,
        response,
    }
}

static SPRINGS: [TableRow; 20] = [
    row("Aluminum [µg/l Al]", "µg/l Al", 0.001828, Reference::Standard { standard: 200.0 }),
    row("Ammonium [mg/l NH4]", "mg/l NH4", 0.040472, Reference::Standard { standard: 0.5 }),
    row("Arsenic [µg/l As]", "µg/l As", 0.009174, Reference::Standard { standard: 10.0 }),
    row("Cadmium [µg/l Cd]", "µg/l Cd", 0.033676, Reference::Standard { standard: 5.0 }),
    row("Chlorides [mg/l Cl]", "mg/l Cl", 0.038744, Reference::Standard { standard: 250.0 }),
    row("Chlorites [µg/l ClO2]", "µg/l ClO2", 0.018832, Reference::Standard { standard: 700.0 }),
    row("Copper [mg/l Cu]", "mg/l Cu", 0.119593, Reference::Standard { standard: 2.0 }),
    row("Fluorides [mg/l F]", "mg/l F", 0.01348, Reference::Standard { standard: 1.5 }),
    row("Hardness [°F]", "°F", 0.100148, Reference::Standard { standard: 50.0 }),
    row("Iron [µg/l Fe]", "µg/l Fe", 0.040982, Reference::Standard { standard: 200.0 }),
    row("Lead [µg/l Pb]", "µg/l Pb", 0.096853, Reference::Standard { standard: 10.0 }),
    row("Magnesium [mg/l Mg]", "mg/l Mg", 0.111423, Reference::Standard { standard: 30.0 }),
    row("Manganese [µg/l Mn]", "µg/l Mn", 0.04212, Reference::Standard { standard: 50.0 }),
    row("Nitrates [mg/l NO3]", "mg/l NO3", 0.019065, Reference::Standard { standard: 50.0 }),
    row("pH", "", 0.076599, Reference::Range { low: 6.5, high: 9.5 }),
    row("Sodium [mg/l Na]", "mg/l Na", 0.016428, Reference::Standard { standard: 200.0 }),
    row("Sulfates [mg/l SO4]", "mg/l SO4", 0.078955, Reference::Standard { standard: 250.0 }),
    row("Turbidity [NTU]", "NTU", 0.049485, Reference::Standard { standard: 0.3 }),
    row("Vanadium [µg/l V]", "µg/l V", 0.010561, Reference::Standard { standard: 140.0 }),
    row("Zinc [µg/l Zn]", "µg/l Zn", 0.081582, Reference::Standard { standard: 5000.0 }),
];

static WELLS: [TableRow; 19] = [
    row("Aluminum [µg/l Al]", "µg/l Al", 0.08524457, Reference::Standard { standard: 200.0 }),
    row("Ammonium [mg/l NH4]", "mg/l NH4", 0.00472345, Reference::Standard { standard: 0.5 }),
    row("Arsenic [µg/l As]", "µg/l As", 0.02818904, Reference::Standard { standard: 10.0 }),
    row("Cadmium [µg/l Cd]", "µg/l Cd", 0.07304108, Reference::Standard { standard: 5.0 }),
    row("Chlorides [mg/l Cl]", "mg/l Cl", 0.05636716, Reference::Standard { standard: 250.0 }),
    row("Copper [mg/l Cu]", "mg/l Cu", 0.0546783, Reference::Standard { standard: 2.0 }),
    row("Fluorides [mg/l F]", "mg/l F", 0.08794153, Reference::Standard { standard: 1.5 }),
    row("Hardness [°F]", "°F", 0.05360424, Reference::Standard { standard: 50.0 }),
    row("Iron [µg/l Fe]", "µg/l Fe", 0.07653616, Reference::Standard { standard: 200.0 }),
    row("Lead [µg/l Pb]", "µg/l Pb", 0.15238569, Reference::Standard { standard: 10.0 }),
    row("Magnesium [mg/l Mg]", "mg/l Mg", 0.06770434, Reference::Standard { standard: 30.0 }),
    row("Manganese [µg/l Mn]", "µg/l Mn", 0.04199309, Reference::Standard { standard: 50.0 }),
    row("Nitrates [mg/l NO3]", "mg/l NO3", 0.02516202, Reference::Standard { standard: 50.0 }),
    row("pH", "", 0.03543887, Reference::Range { low: 6.5, high: 9.5 }),
    row("Sodium [mg/l Na]", "mg/l Na", 0.07688634, Reference::Standard { standard: 200.0 }),
    row("Sulfates [mg/l SO4]", "mg/l SO4", 0.04959354, Reference::Standard { standard: 250.0 }),
    row("Turbidity [NTU]", "NTU", 0.0030536, Reference::Standard { standard: 0.3 }),
    row("Vanadium [µg/l V]", "µg/l V", 0.00286481, Reference::Standard { standard: 140.0 }),
    row("Zinc [µg/l Zn]", "µg/l Zn", 0.02459217, Reference::Standard { standard: 5000.0 }),
];

static LAKES: [TableRow; 20] = [
    row("Aluminum [µg/l Al]", "µg/l Al", 0.13732495, Reference::Standard { standard: 200.0 }),
    row("Ammonium [mg/l NH4]", "mg/l NH4", 0.08499825, Reference::Standard { standard: 0.5 }),
    row("Arsenic [µg/l As]", "µg/l As", 0.00785124, Reference::Standard { standard: 10.0 }),
    row("Cadmium [µg/l Cd]", "µg/l Cd", 0.03023614, Reference::Standard { standard: 5.0 }),
    row("Calcium [mg/l Ca]", "mg/l Ca", 0.0037585, Reference::Standard { standard: 300.0 }),
    row("Chlorides [mg/l Cl]", "mg/l Cl", 0.12006373, Reference::Standard { standard: 250.0 }),
    row("Conductivity at 20°C [µS/cm]", "µS/cm", 0.10301697, Reference::Standard { standard: 2500.0 }),
    row("Copper [mg/l Cu]", "mg/l Cu", 0.05903513, Reference::Standard { standard: 2.0 }),
    row("Fluorides [mg/l F]", "mg/l F", 0.05134627, Reference::Standard { standard: 1.5 }),
    row("Hardness [°F]", "°F", 0.00831767, Reference::Standard { standard: 50.0 }),
    row("Iron [µg/l Fe]", "µg/l Fe", 0.02670118, Reference::Standard { standard: 200.0 }),
    row("Lead [µg/l Pb]", "µg/l Pb", 0.02825393, Reference::Standard { standard: 10.0 }),
    row("Manganese [µg/l Mn]", "µg/l Mn", 0.00192557, Reference::Standard { standard: 50.0 }),
    row("Nitrates [mg/l NO3]", "mg/l NO3", 0.02986598, Reference::Standard { standard: 50.0 }),
    row("pH", "", 0.03950439, Reference::Range { low: 6.5, high: 9.5 }),
    row("Sodium [mg/l Na]", "mg/l Na", 0.08998053, Reference::Standard { standard: 200.0 }),
    row("Sulfates [mg/l SO4]", "mg/l SO4", 0.02081114, Reference::Standard { standard: 250.0 }),
    row("Turbidity [NTU]", "NTU", 0.08237665, Reference::Standard { standard: 0.3 }),
    row("Vanadium [µg/l V]", "µg/l V", 0.03977873, Reference::Standard { standard: 140.0 }),
    row("Zinc [µg/l Zn]", "µg/l Zn", 0.03485305, Reference::Standard { standard: 5000.0 }),
];

static EPA: [TableRow; 8] = [
    row("pH", "", 0.11, ideal_limit(7.0, 8.5, Response::IdealPoint)),
    row("DO", "mg/l O2", 0.17, ideal_limit(5.0, 14.6, Response::IdealPoint)),
    row("BOD5", "mg/l O2", 0.11, ideal_limit(0.0, 5.0, Response::LowerIsBetter)),
    row("Turbidity", "NTU", 0.08, ideal_limit(0.0, 5.0, Response::LowerIsBetter)),
    row("Nitrate", "mg/l N", 0.10, ideal_limit(0.0, 10.0, Response::LowerIsBetter)),
    row("TDS", "mg/l", 0.07, ideal_limit(0.0, 500.0, Response::LowerIsBetter)),
    row("Temperature change", "°C", 0.10, ideal_limit(0.0, 5.0, Response::LowerIsBetter)),
    row("Total coliform", "CFU/100 ml", 0.16, ideal_limit(0.0, 1000.0, Response::Logarithmic)),
];

fn build(name: &str, model: ScoringModel, rows: &[TableRow]) -> Result<ParameterSet, ModelError> {
    let parameters = rows
        .iter()
        .map(|r| ParameterSpec {
            name: r.name.to_string(),
            weight: r.weight,
            unit: r.unit.to_string(),
            reference: r.reference,
        })
        .collect();
    ParameterSet::new(name, model, parameters)
}

pub fn springs() -> Result<ParameterSet, ModelError> {
    build(SPRINGS_SET, ScoringModel::LinearRatio, &SPRINGS)
}

pub fn wells() -> Result<ParameterSet, ModelError> {
    build(WELLS_SET, ScoringModel::LinearRatio, &WELLS)
}

pub fn lakes() -> Result<ParameterSet, ModelError> {
    build(LAKES_SET, ScoringModel::LinearRatio, &LAKES)
}

pub fn epa() -> Result<ParameterSet, ModelError> {
    build(EPA_SET, ScoringModel::IdealLimit, &EPA)
}

pub fn builtin_sets() -> Result<Vec<ParameterSet>, ModelError> {
    Ok(vec![springs()?, wells()?, lakes()?, epa()?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use wqi_core::ClassPolicy;

    #[test]
    fn linear_tables_are_roughly_normalized() {
        for set in [springs().unwrap(), wells().unwrap(), lakes().unwrap()] {
            let total = set.total_weight();
            assert!((total - 1.0).abs() < 0.01, "{}: {total}", set.name());
            assert_eq!(set.policy(), ClassPolicy::AscendingBad);
        }
    }

    #[test]
    fn water_bodies_differ_in_parameters() {
        assert!(springs().unwrap().contains("Chlorites [µg/l ClO2]"));
        assert!(!wells().unwrap().contains("Chlorites [µg/l ClO2]"));
        let lakes = lakes().unwrap();
        assert!(lakes.contains("Calcium [mg/l Ca]"));
        assert!(lakes.contains("Conductivity at 20°C [µS/cm]"));
        assert!(!lakes.contains("Magnesium [mg/l Mg]"));
        assert_eq!(wells().unwrap().len(), 19);
    }

    #[test]
    fn epa_weights_are_not_normalized() {
        let epa = epa().unwrap();
        assert!((epa.total_weight() - 0.9).abs() < 1e-9);
        assert_eq!(epa.policy(), ClassPolicy::DescendingGood);
        assert_eq!(
            epa.get("Total coliform").map(|s| s.reference),
            Some(Reference::IdealLimit {
                ideal: 0.0,
                limit: 1000.0,
                response: Response::Logarithmic
            })
        );
    }
}
