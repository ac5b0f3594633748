use crate::InpaintApp;
use crate::state::{BRUSH_SIZE_MAX, BRUSH_SIZE_MIN, RefinerType, ResolutionMode};

pub fn tools_panel(app: &mut InpaintApp, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(200.0)
        .show(ctx, |ui| {
            ui.heading("Cleanup");
            ui.separator();

            let mut brush_size = app.session().settings().brush_size;
            ui.horizontal(|ui| {
                ui.label("Brush:");
                if ui
                    .add(egui::Slider::new(&mut brush_size, BRUSH_SIZE_MIN..=BRUSH_SIZE_MAX))
                    .changed()
                {
                    app.set_brush_size(brush_size);
                }
            });

            let rendering = app.session().is_rendering();
            let mut hd = app.session().mode().is_hd();
            if ui
                .add_enabled(!rendering, egui::Checkbox::new(&mut hd, "HD"))
                .changed()
            {
                app.set_mode(ResolutionMode::from_hd(hd));
            }

            let current = app.session().refiner();
            egui::ComboBox::from_label("Refiner")
                .selected_text(current.as_str())
                .show_ui(ui, |ui| {
                    for refiner in RefinerType::all() {
                        if ui.selectable_label(current == *refiner, refiner.as_str()).clicked() {
                            app.set_refiner(*refiner, ctx);
                        }
                    }
                });

            ui.separator();

            ui.horizontal(|ui| {
                if ui
                    .add_enabled(app.session().can_undo(), egui::Button::new("Undo"))
                    .clicked()
                {
                    app.undo(false);
                }
                if ui
                    .add_enabled(app.session().can_render(), egui::Button::new("Render"))
                    .clicked()
                {
                    app.start_render(ctx);
                }
            });

            let has_image = app.session().image().is_some();
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(has_image && !rendering, egui::Button::new("Export"))
                    .clicked()
                {
                    app.export();
                }
                if ui
                    .add_enabled(has_image, egui::Button::new("Start over"))
                    .clicked()
                {
                    app.close_image();
                }
            });

            ui.separator();

            let history = app.session().history();
            ui.label(format!("Batches: {}", history.len()));
            ui.label(format!("Strokes: {}", history.completed_stroke_count()));
            if let Some(source) = app.session().image() {
                let (w, h) = source.working_dimensions();
                ui.label(format!("{} ({}x{})", source.name(), w, h));
                if source.is_downscaled() {
                    ui.weak("Downscaled for editing; export keeps full resolution in HD");
                }
            }
            if rendering {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Rendering…");
                });
            }
            if let Some(status) = app.status() {
                ui.label(status);
            }
        });
}
