//! ECharts configurations for the analytics results.
//!
//! Charts are built with `charming` and serialized to the JSON option objects
//! that ECharts expects. The results fragment is swapped in by htmx, so the
//! initialization script runs immediately instead of waiting for
//! `DOMContentLoaded`.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Emphasis, EmphasisFocus, JsFunction,
        Tooltip, Trigger,
    },
    series::{Line, Pie, bar},
};
use maud::{Markup, PreEscaped, html};

use crate::analytics::aggregation::{
    CategoryBucket, MonthlyBucket, PendingMonthBucket, StatusBucket,
};

/// A chart with its HTML container ID and ECharts configuration.
pub(super) struct AnalyticsChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string, safe to embed in `<script>`
    pub options: String,
}

impl AnalyticsChart {
    /// Labels come from uploaded files, so `</` is escaped to keep a label
    /// from closing the surrounding script element.
    pub(super) fn new(id: &'static str, chart: Chart) -> Self {
        Self {
            id,
            options: chart.to_string().replace("</", "<\\/"),
        }
    }
}

/// Renders the chart containers followed by the script that fills them.
pub(super) fn charts_view(charts: &[AnalyticsChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }

        script { (charts_script(charts)) }
    )
}

/// JavaScript that initializes every chart with dark mode support and
/// responsive resizing.
fn charts_script(charts: &[AnalyticsChart]) -> PreEscaped<String> {
    let script = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    if (!chartDom || typeof echarts === 'undefined') return;
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    PreEscaped(script)
}

pub(super) fn services_by_month_chart(monthly: &[MonthlyBucket]) -> Chart {
    let labels: Vec<String> = monthly.iter().map(|bucket| bucket.mes.label()).collect();
    let completados: Vec<f64> = monthly.iter().map(|bucket| bucket.completados as f64).collect();
    let pendientes: Vec<f64> = monthly.iter().map(|bucket| bucket.pendientes as f64).collect();

    Chart::new()
        .title(Title::new().text("Servicios por mes").left(20).top("1%"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow)),
        )
        .legend(Legend::new().left(250).top("1%"))
        .grid(default_grid().top(90))
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(Axis::new().type_(AxisType::Value))
        .series(
            bar::Bar::new()
                .name("Completados")
                .stack("Servicios")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(completados),
        )
        .series(
            bar::Bar::new()
                .name("Pendientes")
                .stack("Servicios")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(pendientes),
        )
}

pub(super) fn revenue_by_month_chart(monthly: &[MonthlyBucket]) -> Chart {
    let labels: Vec<String> = monthly.iter().map(|bucket| bucket.mes.label()).collect();
    let values: Vec<f64> = monthly.iter().map(|bucket| bucket.ingresos).collect();

    Chart::new()
        .title(Title::new().text("Ingresos por mes"))
        .tooltip(currency_tooltip())
        .grid(default_grid())
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Line::new().name("Ingresos").data(values))
}

pub(super) fn category_chart(categories: &[CategoryBucket]) -> Chart {
    let data: Vec<(f64, &str)> = categories
        .iter()
        .map(|bucket| (bucket.cantidad as f64, bucket.categoria.label()))
        .collect();

    pie_chart("Servicios por categoría", "Categoría", data)
}

/// Status buckets with no rows are left out of the pie.
pub(super) fn status_chart(statuses: &[StatusBucket]) -> Chart {
    let data: Vec<(f64, &str)> = statuses
        .iter()
        .filter(|bucket| bucket.cantidad > 0)
        .map(|bucket| (bucket.cantidad as f64, bucket.estado.label()))
        .collect();

    pie_chart("Servicios por estado", "Estado", data)
}

/// The state counts reported by the backend, as a bar per state.
pub(super) fn backend_states_chart(estado_counts: &[(String, f64)]) -> Chart {
    let labels: Vec<String> = estado_counts.iter().map(|(label, _)| label.clone()).collect();
    let values: Vec<f64> = estado_counts.iter().map(|(_, value)| *value).collect();

    Chart::new()
        .title(
            Title::new()
                .text("Estados del archivo")
                .subtext("Según el servidor de reportes"),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow)),
        )
        .grid(default_grid())
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(Axis::new().type_(AxisType::Value))
        .series(bar::Bar::new().name("Servicios").data(values))
}

/// Special states (e.g. warranty or courtesy visits) per month, one stacked
/// series per state.
pub(super) fn special_states_chart(by_month: &[(String, Vec<(String, f64)>)]) -> Chart {
    let labels: Vec<String> = by_month.iter().map(|(month, _)| month.clone()).collect();

    let mut states: Vec<&str> = Vec::new();
    for (_, counts) in by_month {
        for (state, _) in counts {
            if !states.contains(&state.as_str()) {
                states.push(state);
            }
        }
    }

    let mut chart = Chart::new()
        .title(Title::new().text("Estados especiales por mes").left(20).top("1%"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow)),
        )
        .legend(Legend::new().left(250).top("1%"))
        .grid(default_grid().top(90))
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(Axis::new().type_(AxisType::Value));

    for state in states {
        let data: Vec<f64> = by_month
            .iter()
            .map(|(_, counts)| {
                counts
                    .iter()
                    .find(|(candidate, _)| candidate == state)
                    .map(|(_, value)| *value)
                    .unwrap_or(0.0)
            })
            .collect();

        chart = chart.series(
            bar::Bar::new()
                .name(state)
                .stack("Estados")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(data),
        );
    }

    chart
}

/// Pending cash and transfer amounts per month.
pub(super) fn pending_by_month_chart(title: &str, buckets: &[PendingMonthBucket]) -> Chart {
    let labels: Vec<String> = buckets.iter().map(|bucket| bucket.mes.iso()).collect();
    let efectivo: Vec<f64> = buckets.iter().map(|bucket| bucket.efectivo_total).collect();
    let transferencia: Vec<f64> = buckets
        .iter()
        .map(|bucket| bucket.transferencia_total)
        .collect();

    Chart::new()
        .title(Title::new().text(title).left(20).top("1%"))
        .tooltip(currency_tooltip())
        .legend(Legend::new().left(250).top("1%"))
        .grid(default_grid().top(90))
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(
            bar::Bar::new()
                .name("Efectivo")
                .stack("Pendiente")
                .data(efectivo),
        )
        .series(
            bar::Bar::new()
                .name("Transferencia")
                .stack("Pendiente")
                .data(transferencia),
        )
}

fn pie_chart(title: &str, series_name: &str, data: Vec<(f64, &str)>) -> Chart {
    Chart::new()
        .title(Title::new().text(title))
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .legend(Legend::new().bottom("1%"))
        .series(
            Pie::new()
                .name(series_name)
                .radius(vec!["40%", "70%"])
                .data(data),
        )
}

fn default_grid() -> Grid {
    Grid::new()
        .left("3%")
        .right("4%")
        .bottom("3%")
        .contain_label(true)
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('es-CO', {
              style: 'currency',
              currency: 'COP',
              maximumFractionDigits: 0
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
