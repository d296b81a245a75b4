/// Example: Run the terminal scene with a layout read from a JSON file
///
/// Usage: cargo run --example custom_layout -- path/to/scene.json
///
/// Any field left out of the file keeps its default.
use pool3d_core::SceneConfig;
use pool3d_terminal::{status, TerminalApp};
use std::env;
use std::fs;
use std::io;

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();
    let _ = status::init();

    let config = match args.get(1) {
        Some(path) => {
            println!("Loading scene config: {}", path);
            let json = fs::read_to_string(path).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Failed to read config: {}", e),
                )
            })?;
            SceneConfig::from_json(&json).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Failed to parse config: {}", e),
                )
            })?
        }
        None => {
            eprintln!("Usage: {} <scene.json>", args[0]);
            eprintln!("\nNo config provided, using the default rack...");
            SceneConfig::default()
        }
    };

    println!(
        "{} balls on a {}x{} table",
        2 + config.layout.extra_balls.len(),
        2.0 * config.layout.table_half_width,
        2.0 * config.layout.table_half_depth
    );
    std::thread::sleep(std::time::Duration::from_secs(1));

    let mut app = TerminalApp::new(config)?;
    app.run()?;

    println!("Thank you for using Pool3D Terminal Renderer!");
    Ok(())
}
