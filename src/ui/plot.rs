use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoints, Points};
use tips_dashboard::data::filter::{BillTip, SmokerSplit};
use tips_dashboard::state::AppState;

const CHART_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Chart grid (central panel)
// ---------------------------------------------------------------------------

/// Render the four charts in a 2×2 grid.
pub fn charts(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a tips dataset to start  (File → Open…)");
        });
        return;
    }

    let views = &state.views;
    ui.columns(2, |columns| {
        bill_tip_scatter(
            &mut columns[0],
            "day_scatter",
            "Total Bill vs Tip Amount",
            &views.day_scatter,
        );
        smoker_split_chart(&mut columns[1], views.smoker_split);
    });
    ui.add_space(8.0);
    ui.columns(2, |columns| {
        size_tip_bars(&mut columns[0], state);
        match &views.range_error {
            Some(msg) => {
                columns[1].heading("Filtered Scatter Plot");
                columns[1].label(RichText::new(msg).color(Color32::RED));
            }
            None => bill_tip_scatter(
                &mut columns[1],
                "range_scatter",
                "Filtered Scatter Plot",
                &views.range_scatter,
            ),
        }
    });
}

fn bill_tip_scatter(ui: &mut Ui, id: &str, title: &str, points: &[BillTip]) {
    ui.heading(title);
    let series: PlotPoints = points.iter().map(|p| [p.total_bill, p.tip]).collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .x_axis_label("Total Bill")
        .y_axis_label("Tip Amount")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.points(Points::new(series).radius(4.0).name("Tip Amount"));
        });
}

/// Smokers vs non-smokers as two labelled bars.
fn smoker_split_chart(ui: &mut Ui, split: SmokerSplit) {
    ui.heading("Smokers vs Non-smokers");

    let share = split.smoker_share();
    let label = |name: &str, count: usize, fraction: Option<f64>| match fraction {
        Some(f) => format!("{name}: {count} ({:.1}%)", f * 100.0),
        None => format!("{name}: {count}"),
    };
    let smokers = label("Smokers", split.smokers, share);
    let non_smokers = label("Non-smokers", split.non_smokers, share.map(|s| 1.0 - s));

    Plot::new("smoker_split")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .y_axis_label("Parties")
        .show_x(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(vec![Bar::new(0.0, split.smokers as f64).width(0.6)])
                    .name(&smokers),
            );
            plot_ui.bar_chart(
                BarChart::new(vec![Bar::new(1.0, split.non_smokers as f64).width(0.6)])
                    .name(&non_smokers),
            );
        });
}

/// One bar per record of the selected sex, at its party size.
fn size_tip_bars(ui: &mut Ui, state: &AppState) {
    ui.heading(format!("Size vs Tip Amount ({})", state.filters.sex));
    let bars: Vec<Bar> = state
        .views
        .size_tips
        .iter()
        .map(|st| Bar::new(f64::from(st.size), st.tip).width(0.8))
        .collect();

    Plot::new("size_tips")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Size")
        .y_axis_label("Tip Amount")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Tip Amount"));
        });
}
