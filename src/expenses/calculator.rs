//! Balance between consigned money and expenses.

use serde::Serialize;

use crate::expenses::models::{ConsignmentEntry, ExpenseEntry};

/// Totals and who owes whom after a work trip.
///
/// At most one of [ExpenseSummary::vueltas_a_favor_de_abrecar] and
/// [ExpenseSummary::excedente_a_favor_de_jg] is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpenseSummary {
    pub total_gastos: f64,
    pub total_consignado: f64,
    /// Money left over that must be returned to Abrecar.
    pub vueltas_a_favor_de_abrecar: f64,
    /// Money spent beyond the consignments that Abrecar owes to JG.
    pub excedente_a_favor_de_jg: f64,
}

/// Compares the consigned total against the expense total.
pub fn calculate_expenses(
    gastos: &[ExpenseEntry],
    consignaciones: &[ConsignmentEntry],
) -> ExpenseSummary {
    let total_gastos: f64 = gastos.iter().map(|gasto| gasto.monto).sum();
    let total_consignado: f64 = consignaciones
        .iter()
        .map(|consignacion| consignacion.monto)
        .sum();
    let diferencia = total_consignado - total_gastos;

    let (vueltas_a_favor_de_abrecar, excedente_a_favor_de_jg) = if diferencia > 0.0 {
        (diferencia, 0.0)
    } else if diferencia < 0.0 {
        (0.0, -diferencia)
    } else {
        (0.0, 0.0)
    };

    ExpenseSummary {
        total_gastos,
        total_consignado,
        vueltas_a_favor_de_abrecar,
        excedente_a_favor_de_jg,
    }
}

#[cfg(test)]
mod tests {
    use crate::expenses::models::{ConsignmentEntry, ExpenseEntry};

    use super::calculate_expenses;

    fn gasto(monto: f64) -> ExpenseEntry {
        ExpenseEntry {
            fecha: "2024-05-01".to_owned(),
            categoria: "Materiales".to_owned(),
            monto,
            descripcion: String::new(),
        }
    }

    fn consignacion(monto: f64) -> ConsignmentEntry {
        ConsignmentEntry {
            fecha: "2024-05-01".to_owned(),
            entregado_por: "Oficina".to_owned(),
            monto,
            descripcion: String::new(),
        }
    }

    #[test]
    fn leftover_money_is_returned_to_abrecar() {
        let summary = calculate_expenses(&[gasto(200000.0)], &[consignacion(250000.0)]);

        assert_eq!(summary.vueltas_a_favor_de_abrecar, 50000.0);
        assert_eq!(summary.excedente_a_favor_de_jg, 0.0);
    }

    #[test]
    fn overspending_is_owed_to_jg() {
        let summary = calculate_expenses(
            &[gasto(120000.0), gasto(80000.0)],
            &[consignacion(150000.0)],
        );

        assert_eq!(summary.total_gastos, 200000.0);
        assert_eq!(summary.vueltas_a_favor_de_abrecar, 0.0);
        assert_eq!(summary.excedente_a_favor_de_jg, 50000.0);
    }

    #[test]
    fn exact_balance_zeroes_both_sides() {
        let summary = calculate_expenses(&[gasto(100.0)], &[consignacion(100.0)]);

        assert_eq!(summary.vueltas_a_favor_de_abrecar, 0.0);
        assert_eq!(summary.excedente_a_favor_de_jg, 0.0);
    }

    #[test]
    fn difference_identity_holds() {
        let cases = [
            (vec![10.0, 20.0], vec![5.0]),
            (vec![], vec![40.0, 2.5]),
            (vec![7.0], vec![7.0]),
            (vec![], vec![]),
        ];

        for (gastos, consignaciones) in cases {
            let gastos: Vec<_> = gastos.into_iter().map(gasto).collect();
            let consignaciones: Vec<_> = consignaciones.into_iter().map(consignacion).collect();

            let summary = calculate_expenses(&gastos, &consignaciones);

            assert_eq!(
                summary.vueltas_a_favor_de_abrecar - summary.excedente_a_favor_de_jg,
                summary.total_consignado - summary.total_gastos
            );
            assert!(
                summary.vueltas_a_favor_de_abrecar == 0.0 || summary.excedente_a_favor_de_jg == 0.0
            );
        }
    }
}
