use link_deck::gui::frontend::BoardApp;
use link_deck::persistence::settings::AppSettings;
use link_deck::persistence::store::{self, DirStore};

use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();
    let settings = AppSettings::load().unwrap_or_default();
    store::set_settings_override(settings.clone());
    let store = DirStore::open_default();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1120.0, 720.0])
            // Provide sensible bounds so the UI stays usable on small screens
            .with_min_inner_size([640.0, 420.0])
            .with_resizable(true),
        ..Default::default()
    };
    eframe::run_native(
        "LinkDeck",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(BoardApp::new(Box::new(store), settings)) as Box<dyn eframe::App>)
        }),
    )
}
