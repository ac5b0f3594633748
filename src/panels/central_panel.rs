use crate::InpaintApp;

pub fn central_panel(app: &mut InpaintApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let available_size = ui.available_size();
        let (response, painter) =
            ui.allocate_painter(available_size, egui::Sense::click_and_drag());
        let canvas_rect = response.rect;

        if app.session().image().is_none() {
            painter.text(
                canvas_rect.center(),
                egui::Align2::CENTER_CENTER,
                "Drop an image here",
                egui::FontId::proportional(20.0),
                ui.visuals().weak_text_color(),
            );
            return;
        }

        app.handle_canvas_input(ctx, canvas_rect);
        app.paint_canvas(&painter, canvas_rect);

        if app.session().is_rendering() {
            ui.put(
                egui::Rect::from_center_size(canvas_rect.center(), egui::vec2(40.0, 40.0)),
                egui::Spinner::new().size(32.0),
            );
        }
    });
}
