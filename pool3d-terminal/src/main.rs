/// Pool3D Terminal Demo - scripted pool shot
///
/// Controls:
///   - Space: Take the shot (again, once it has finished)
///   - Q/ESC: Quit
use pool3d_core::SceneConfig;
use pool3d_terminal::{status, TerminalApp};
use std::io;

fn main() -> io::Result<()> {
    if let Err(e) = status::init() {
        eprintln!("Logger already installed: {}", e);
    }

    println!("Pool3D Terminal Renderer - press Space to shoot, Q to quit");
    std::thread::sleep(std::time::Duration::from_secs(1));

    let mut app = TerminalApp::new(SceneConfig::default())?;
    app.run()?;

    println!("Thank you for using Pool3D Terminal Renderer!");
    Ok(())
}
