use std::path::Path;
use std::process::Command;
use log::debug;
use crate::{MosaicError, Result};

const TIFIG: &str = "tifig";

/// Converts an HEIF image to a JPEG at `output`, scaled and cropped to `width` by `height`, with
/// the external `tifig` executable, which must be on `PATH`. `tifig` does not upscale, so bounds
/// larger than the source leave it uncropped.
pub fn convert_and_resize(input: &Path, output: &Path, width: u32, height: u32) -> Result<()> {
    let mut command = tifig_command(input, output, width, height);
    debug!("running {:?}", command);

    let result = command.output()?;
    if !result.status.success() {
        let mut combined = String::from_utf8_lossy(&result.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&result.stderr));
        return Err(MosaicError::Conversion(format!("{}: {}", result.status, combined.trim())));
    }

    Ok(())
}

fn tifig_command(input: &Path, output: &Path, width: u32, height: u32) -> Command {
    let mut command = Command::new(TIFIG);
    command.arg(input)
        .arg(output)
        .arg("--crop")
        .arg("-w")
        .arg(width.to_string())
        .arg("-h")
        .arg(height.to_string());
    command
}
