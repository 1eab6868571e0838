use macroquad::prelude::*;
use macroquad_gridmap::config::default_form_request;
use macroquad_gridmap::preview::{preview_to_start, render_preview, start_to_preview};
use macroquad_gridmap::{logging, scale_to_fit, NoiseGenerator, Xy};

const PREVIEW: Xy = Xy { x: 512, y: 512 };

fn window_conf() -> Conf {
    Conf {
        window_title: "Map Preview".into(),
        window_width: 640,
        window_height: 640,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    logging::init();

    let mut request = default_form_request();
    let mut noise = NoiseGenerator::default();
    let fit = scale_to_fit(request.size, PREVIEW);
    let image = render_preview(&request, PREVIEW, &mut noise);
    let texture = Texture2D::from_image(&image);
    texture.set_filter(FilterMode::Nearest);

    let origin = Vec2::new(64.0, 64.0);

    loop {
        // drag the start marker
        if is_mouse_button_down(MouseButton::Left) {
            let mouse = Vec2::from(mouse_position()) - origin;
            if let Some(start) = preview_to_start(mouse, request.size, PREVIEW, &fit) {
                request.start = start;
            }
        }
        if is_key_pressed(KeyCode::P) {
            match serde_json::to_string_pretty(&request) {
                Ok(txt) => println!("{txt}"),
                Err(e) => log::error!("{e}"),
            }
        }

        clear_background(DARKGRAY);
        draw_texture_ex(
            &texture,
            origin.x + fit.margin.x,
            origin.y + fit.margin.y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(fit.size.as_vec2() * fit.scale),
                ..Default::default()
            },
        );

        let marker = origin + start_to_preview(request.start, request.size, &fit);
        draw_circle_lines(marker.x, marker.y, 6.0, 2.0, RED);
        draw_text(
            &format!("Start {:?}  (P prints the request)", request.start),
            10.0,
            30.0,
            24.0,
            WHITE,
        );

        next_frame().await;
    }
}
