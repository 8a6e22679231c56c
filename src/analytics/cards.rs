//! Card components for the headline figures.

use maud::{Markup, html};

use crate::{
    analytics::aggregation::{Kpis, Trends},
    html::{CARD_STYLE, format_money},
};

const TREND_UP_STYLE: &str = "text-green-600 dark:text-green-400";
const TREND_DOWN_STYLE: &str = "text-red-600 dark:text-red-400";
const TREND_FLAT_STYLE: &str = "text-gray-600 dark:text-gray-400";

/// Formats a growth percentage with an explicit sign, avoiding "-0,0%".
fn format_growth(value: f64) -> String {
    if value.abs() < 0.05 {
        return "0,0%".to_owned();
    }

    let sign = if value > 0.0 { "+" } else { "-" };
    format!("{sign}{:.1}%", value.abs()).replace('.', ",")
}

fn growth_style(value: f64) -> &'static str {
    if value.abs() < 0.05 {
        TREND_FLAT_STYLE
    } else if value > 0.0 {
        TREND_UP_STYLE
    } else {
        TREND_DOWN_STYLE
    }
}

fn card(id: Option<&str>, title: &str, value: &str, caption: &str) -> Markup {
    html! {
        div id=[id] class={ (CARD_STYLE) " flex flex-col justify-between" }
        {
            h4 class="text-sm font-medium text-gray-600 dark:text-gray-400" { (title) }
            p class="text-2xl font-bold mt-2" data-value { (value) }
            @if !caption.is_empty() {
                p class="text-xs mt-2 text-gray-500 dark:text-gray-400" { (caption) }
            }
        }
    }
}

/// The KPI grid. `undated` rows count towards every figure here but are left
/// out of the monthly views, so the cards say how many there are.
pub(super) fn kpi_cards_view(kpis: &Kpis, undated: usize) -> Markup {
    let undated_caption = match undated {
        0 => String::new(),
        1 => "1 servicio sin fecha válida".to_owned(),
        count => format!("{count} servicios sin fecha válida"),
    };

    html! {
        section id="kpis" class="w-full mx-auto mb-8"
        {
            div class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-3 xl:grid-cols-6 gap-4"
            {
                (card(Some("kpi-total"), "Total servicios", &kpis.total_servicios.to_string(), &undated_caption))
                (card(Some("kpi-ingresos"), "Ingresos totales", &format_money(kpis.ingresos_totales), ""))
                (card(Some("kpi-completados"), "Completados", &kpis.completados.to_string(), ""))
                (card(Some("kpi-pendientes"), "Pendientes", &kpis.pendientes.to_string(), ""))
                (card(Some("kpi-tasa"), "Tasa de completado", &format!("{}%", kpis.tasa_completado), ""))
                (card(Some("kpi-promedio"), "Ingreso promedio", &format_money(kpis.ingreso_promedio), ""))
            }
        }
    }
}

pub(super) fn trend_cards_view(trends: &Trends) -> Markup {
    let Some(mes_actual) = trends.mes_actual else {
        return html! {};
    };

    let comparison = match trends.mes_anterior {
        Some(mes_anterior) => format!(
            "{} frente a {}",
            mes_actual.long_label(),
            mes_anterior.long_label()
        ),
        None => format!("{}, sin mes anterior para comparar", mes_actual.long_label()),
    };

    html! {
        section id="trends" class="w-full mx-auto mb-8"
        {
            div class="flex justify-between items-baseline mb-4"
            {
                h3 class="text-xl font-semibold" { "Tendencia mensual" }
                span class="text-sm text-gray-600 dark:text-gray-400" { (comparison) }
            }

            div class="grid grid-cols-1 sm:grid-cols-2 gap-4"
            {
                (trend_card("trend-servicios", "Crecimiento en servicios", trends.crecimiento_servicios))
                (trend_card("trend-ingresos", "Crecimiento en ingresos", trends.crecimiento_ingresos))
            }
        }
    }
}

fn trend_card(id: &str, title: &str, growth: f64) -> Markup {
    html! {
        div id=(id) class=(CARD_STYLE)
        {
            h4 class="text-sm font-medium text-gray-600 dark:text-gray-400" { (title) }
            p class={ "text-2xl font-bold mt-2 " (growth_style(growth)) } data-value
            {
                (format_growth(growth))
            }
        }
    }
}

/// Totals computed by the backend over the whole file.
pub(super) fn backend_totals_view(
    pendientes_relacionar: f64,
    pendientes_cobrar: f64,
    especiales: &[(String, f64)],
) -> Markup {
    html! {
        section id="backend-totals" class="w-full mx-auto mb-8"
        {
            div class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-4 gap-4"
            {
                (card(Some("total-pendientes-relacionar"), "Pendientes por relacionar", &format_money(pendientes_relacionar), ""))
                (card(Some("total-pendientes-cobrar"), "Pendientes por cobrar", &format_money(pendientes_cobrar), ""))

                @for (estado, cantidad) in especiales {
                    (card(None, estado, &format!("{cantidad:.0}"), "Estado especial"))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use crate::analytics::{
        aggregation::{Kpis, Trends},
        month::MonthKey,
    };

    use super::{format_growth, kpi_cards_view, trend_cards_view};

    fn card_value(html: &Html, id: &str) -> String {
        let selector = Selector::parse(&format!("#{id} [data-value]")).unwrap();
        html.select(&selector)
            .next()
            .unwrap_or_else(|| panic!("card {id} missing"))
            .text()
            .collect::<String>()
            .trim()
            .to_owned()
    }

    #[test]
    fn growth_has_sign_and_comma() {
        assert_eq!(format_growth(12.34), "+12,3%");
        assert_eq!(format_growth(-50.0), "-50,0%");
        assert_eq!(format_growth(-0.01), "0,0%");
    }

    #[test]
    fn kpi_cards_show_figures() {
        let kpis = Kpis {
            total_servicios: 4,
            ingresos_totales: 450000.0,
            completados: 3,
            pendientes: 1,
            tasa_completado: 75,
            ingreso_promedio: 112500.0,
        };

        let html = Html::parse_fragment(&kpi_cards_view(&kpis, 2).into_string());

        assert_eq!(card_value(&html, "kpi-total"), "4");
        assert_eq!(card_value(&html, "kpi-ingresos"), "$ 450.000");
        assert_eq!(card_value(&html, "kpi-tasa"), "75%");
        let text: String = html.root_element().text().collect();
        assert!(text.contains("2 servicios sin fecha válida"));
    }

    #[test]
    fn trends_are_hidden_without_data() {
        let trends = Trends {
            mes_actual: None,
            mes_anterior: None,
            crecimiento_servicios: 0.0,
            crecimiento_ingresos: 0.0,
        };

        assert!(trend_cards_view(&trends).into_string().is_empty());
    }

    #[test]
    fn trends_compare_named_months() {
        let trends = Trends {
            mes_actual: Some(MonthKey { year: 2024, month: 2 }),
            mes_anterior: Some(MonthKey { year: 2024, month: 1 }),
            crecimiento_servicios: 100.0,
            crecimiento_ingresos: -25.0,
        };

        let html = Html::parse_fragment(&trend_cards_view(&trends).into_string());

        assert_eq!(card_value(&html, "trend-servicios"), "+100,0%");
        assert_eq!(card_value(&html, "trend-ingresos"), "-25,0%");
        let text: String = html.root_element().text().collect();
        assert!(text.contains("Febrero 2024 frente a Enero 2024"));
    }
}
