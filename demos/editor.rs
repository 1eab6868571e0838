use macroquad::prelude::*;
use macroquad_gridmap::pointer::PointerController;
use macroquad_gridmap::{logging, EditState, Editor, EditorConfig, PointerType};
use std::path::Path;

const CONFIG_PATH: &str = "editor.json";
const SAVE_PATH: &str = "map.json";

fn window_conf() -> Conf {
    Conf {
        window_title: "Grid Map Editor".into(),
        window_width: 1280,
        window_height: 720,
        high_dpi: true,
        ..Default::default()
    }
}

fn load_config() -> EditorConfig {
    if !Path::new(CONFIG_PATH).exists() {
        return EditorConfig::default();
    }
    EditorConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        log::error!("{e:#}");
        EditorConfig::default()
    })
}

#[macroquad::main(window_conf)]
async fn main() {
    logging::init();
    let config = load_config();

    let mut editor = Editor::new(&config);
    editor.load_tilesets(&config.tiles_dir).await;
    editor.resize(Vec2::new(screen_width(), screen_height()));
    editor.generate(&config.generation);

    let mut screen = Vec2::new(screen_width(), screen_height());

    loop {
        let now = Vec2::new(screen_width(), screen_height());
        if now != screen {
            screen = now;
            editor.resize(screen);
        }

        // camera
        for key in get_keys_pressed() {
            if let Some(delta) = PointerController::key_delta(key) {
                editor.move_by(delta);
            }
        }
        if let Some(delta) = PointerController::wheel_delta(mouse_wheel().1) {
            editor.move_by(delta);
        }

        // modes and tools
        if is_key_pressed(KeyCode::Tab) {
            let next = match editor.pointer().state() {
                EditState::Normal => EditState::Edit,
                EditState::Edit => EditState::Normal,
            };
            editor.pointer_mut().set_state(next);
        }
        if editor.pointer().state() == EditState::Edit {
            for (key, tool) in [
                (KeyCode::Key1, PointerType::Select),
                (KeyCode::Key2, PointerType::Add),
                (KeyCode::Key3, PointerType::Remove),
            ] {
                if is_key_pressed(key) {
                    editor.pointer_mut().set_pointer(tool);
                }
            }
        }

        // files
        if is_key_pressed(KeyCode::G) {
            let seeds = editor.generate(&config.generation);
            log::info!("seeds {seeds:?}");
        }
        if is_key_pressed(KeyCode::F5) {
            match editor.save_file(SAVE_PATH) {
                Ok(()) => log::info!("saved {SAVE_PATH}"),
                Err(e) => log::error!("{e}"),
            }
        }
        if is_key_pressed(KeyCode::F9) {
            if let Err(e) = editor.load_file(SAVE_PATH) {
                log::error!("{e}");
            }
        }

        // mouse
        let mouse: Vec2 = mouse_position().into();
        if is_mouse_button_pressed(MouseButton::Left) {
            editor.mouse_down(mouse);
        } else {
            editor.mouse_move(mouse, is_mouse_button_down(MouseButton::Left));
        }
        if is_mouse_button_released(MouseButton::Left) {
            editor.mouse_up(mouse);
        }

        editor.pump();

        clear_background(Color::from_rgba(2, 62, 88, 255));
        editor.draw(YELLOW);

        let label = editor.pointer().label_text();
        for (i, line) in label.lines().enumerate() {
            draw_text(line, mouse.x + 16.0, mouse.y + 16.0 + i as f32 * 20.0, 20.0, WHITE);
        }

        let selected = editor.renderer().selected();
        draw_text(
            &format!(
                "{:?} {} | {:?} layer {} | {:.1?} | FPS: {}",
                editor.pointer().state(),
                editor.pointer().pointer(),
                editor.renderer().center_location(),
                selected.layer,
                editor.renderer().update_time(),
                get_fps()
            ),
            10.0,
            24.0,
            24.0,
            WHITE,
        );

        next_frame().await;
    }
}
