#![warn(clippy::all, rust_2018_idioms)]

fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([480.0, 360.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "Cleanup",
        native_options,
        Box::new(|cc| Ok(Box::new(eframe_inpaint::InpaintApp::new(cc)))),
    )
}
