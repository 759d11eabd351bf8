use std::collections::BTreeSet;
use std::fmt::Display;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use tips_dashboard::data::model::{Day, Sex, Time};
use tips_dashboard::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets, one group per chart
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(bounds) = state.dataset.as_ref().and_then(|ds| ds.bill_bounds()) else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            group(ui, "Total Bill vs Tip Amount", |ui| {
                ui.label("Select Days:");
                if let Some(day) = checklist(ui, Day::ALL, &state.filters.days) {
                    state.toggle_day(day);
                }
            });

            group(ui, "Smokers vs Non-smokers", |ui| {
                ui.label("Select Time:");
                if let Some(time) = checklist(ui, Time::ALL, &state.filters.split_times) {
                    state.toggle_split_time(time);
                }
            });

            group(ui, "Size vs Tip Amount", |ui| {
                let mut sex = state.filters.sex;
                ui.horizontal(|ui: &mut Ui| {
                    for &option in Sex::ALL {
                        ui.radio_value(&mut sex, option, option.label());
                    }
                });
                if sex != state.filters.sex {
                    state.set_sex(sex);
                }
            });

            group(ui, "Filtered Scatter Plot", |ui| {
                bill_range_sliders(ui, state, bounds);
                if let Some(time) = checklist(ui, Time::ALL, &state.filters.range_times) {
                    state.toggle_range_time(time);
                }
            });
        });
}

fn group(ui: &mut Ui, title: &str, add_contents: impl FnOnce(&mut Ui)) {
    egui::CollapsingHeader::new(RichText::new(title).strong())
        .id_salt(title)
        .default_open(true)
        .show(ui, add_contents);
}

/// One checkbox per option. Returns the option the user toggled this frame.
fn checklist<T: Copy + Ord + Display>(
    ui: &mut Ui,
    options: &[T],
    selected: &BTreeSet<T>,
) -> Option<T> {
    let mut toggled = None;
    for &option in options {
        let mut checked = selected.contains(&option);
        if ui.checkbox(&mut checked, option.to_string()).changed() {
            toggled = Some(option);
        }
    }
    toggled
}

/// Low/high sliders over the dataset's bill range, step 1.
fn bill_range_sliders(ui: &mut Ui, state: &mut AppState, (min, max): (f64, f64)) {
    let (mut lo, mut hi) = state.filters.bill_range;

    let low = ui.add(
        egui::Slider::new(&mut lo, min..=max)
            .step_by(1.0)
            .text("Low"),
    );
    if low.changed() {
        state.set_bill_low(lo);
    }

    let high = ui.add(
        egui::Slider::new(&mut hi, min..=max)
            .step_by(1.0)
            .text("High"),
    );
    if high.changed() {
        state.set_bill_high(hi);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let source = state.source.as_deref().unwrap_or_default();
            ui.label(format!("{source}: {} records", ds.len()));

            if let Some(report) = &state.report {
                if report.rows_dropped() > 0 {
                    ui.label(format!("({} rows dropped while cleaning)", report.rows_dropped()));
                }
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open tips data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.load_path(&path) {
            state.status_message = Some(format!("Error: {e}"));
        }
    }
}
